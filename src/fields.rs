//! Access to field values at quadrature points.
use crate::element::ShapeTable;
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName, OVector};
use crate::variable::VariableId;
use crate::Real;
use rustc_hash::FxHashMap;

/// Supplies the current state of the primary unknown and of coupled variables on an
/// element or facet.
///
/// Implementations are read-only views owned by whoever drives the evaluation.
pub trait FieldAccessor<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn num_quadrature_points(&self) -> usize;

    /// Value of the primary unknown at a quadrature point.
    fn u(&self, qp: usize) -> T;

    fn grad_u(&self, qp: usize) -> &OVector<T, D>;

    /// Time derivative of the primary unknown at a quadrature point.
    fn u_dot(&self, qp: usize) -> T;

    /// Derivative of `u_dot` with respect to the nodal values of `u`, e.g. `1 / dt` for
    /// backward Euler.
    fn du_dot_du(&self) -> T;

    /// Nodal values (degrees of freedom) of the primary unknown on the element.
    fn nodal_u(&self) -> &[T];

    fn has_coupled(&self, variable: VariableId) -> bool;

    /// Value of a coupled variable at a quadrature point.
    ///
    /// Only called for variables for which [`has_coupled`](Self::has_coupled) returns `true`.
    fn coupled(&self, variable: VariableId, qp: usize) -> T;
}

/// Field values on a single element, stored per quadrature point.
#[derive(Debug, Clone)]
pub struct ElementFields<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    u: Vec<T>,
    grad_u: Vec<OVector<T, D>>,
    u_dot: Vec<T>,
    du_dot_du: T,
    nodal_u: Vec<T>,
    coupled: FxHashMap<VariableId, Vec<T>>,
}

impl<T, D> ElementFields<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Interpolates the primary unknown from its nodal values.
    ///
    /// The time derivative is zero until set with
    /// [`with_time_derivative`](Self::with_time_derivative).
    ///
    /// # Panics
    ///
    /// Panics if the number of nodal values differs from the number of functions in `trial`.
    pub fn from_nodal_values(trial: &ShapeTable<T, D>, nodal_u: &[T]) -> Self {
        let nq = trial.num_points();
        Self {
            u: (0..nq).map(|qp| trial.interpolate(nodal_u, qp)).collect(),
            grad_u: (0..nq)
                .map(|qp| trial.interpolate_gradient(nodal_u, qp))
                .collect(),
            u_dot: vec![T::zero(); nq],
            du_dot_du: T::zero(),
            nodal_u: nodal_u.to_vec(),
            coupled: FxHashMap::default(),
        }
    }

    /// Interpolates the time derivative from nodal rates.
    pub fn with_time_derivative(mut self, trial: &ShapeTable<T, D>, nodal_u_dot: &[T], du_dot_du: T) -> Self {
        self.u_dot = (0..self.u.len())
            .map(|qp| trial.interpolate(nodal_u_dot, qp))
            .collect();
        self.du_dot_du = du_dot_du;
        self
    }

    /// Interpolates a coupled variable from its nodal values.
    pub fn with_coupled_nodal_values(mut self, variable: VariableId, shape: &ShapeTable<T, D>, nodal: &[T]) -> Self {
        let values = (0..self.u.len())
            .map(|qp| shape.interpolate(nodal, qp))
            .collect();
        self.coupled.insert(variable, values);
        self
    }

    /// Sets a coupled variable from values given directly at the quadrature points.
    ///
    /// # Panics
    ///
    /// Panics if the number of values differs from the number of quadrature points.
    pub fn with_coupled_values(mut self, variable: VariableId, values: Vec<T>) -> Self {
        assert_eq!(values.len(), self.u.len(), "Need one value per quadrature point");
        self.coupled.insert(variable, values);
        self
    }

    pub fn with_coupled_constant(self, variable: VariableId, value: T) -> Self {
        let values = vec![value; self.u.len()];
        self.with_coupled_values(variable, values)
    }
}

impl<T, D> FieldAccessor<T, D> for ElementFields<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn num_quadrature_points(&self) -> usize {
        self.u.len()
    }

    fn u(&self, qp: usize) -> T {
        self.u[qp]
    }

    fn grad_u(&self, qp: usize) -> &OVector<T, D> {
        &self.grad_u[qp]
    }

    fn u_dot(&self, qp: usize) -> T {
        self.u_dot[qp]
    }

    fn du_dot_du(&self) -> T {
        self.du_dot_du
    }

    fn nodal_u(&self) -> &[T] {
        &self.nodal_u
    }

    fn has_coupled(&self, variable: VariableId) -> bool {
        self.coupled.contains_key(&variable)
    }

    fn coupled(&self, variable: VariableId, qp: usize) -> T {
        self.coupled[&variable][qp]
    }
}
