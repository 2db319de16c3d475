use crate::kernel::{Kernel, TestPoint, TrialPoint};
use crate::kernels::coupled_variable_ids;
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName};
use crate::variable::{Coupled, VariableId};
use crate::Real;

/// The coefficient multiplying the time derivative in a [`CoefficientTimeDerivative`].
pub trait TimeDerivativeCoefficient<T, D>: Send + Sync
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn coefficient(&self, point: &TestPoint<T, D>) -> T;

    /// Variables the coefficient reads.
    fn coupled_variables(&self) -> Vec<VariableId> {
        Vec::new()
    }
}

impl<T, D> TimeDerivativeCoefficient<T, D> for Coupled<T>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn coefficient(&self, point: &TestPoint<T, D>) -> T {
        point.coupled(self)
    }

    fn coupled_variables(&self) -> Vec<VariableId> {
        coupled_variable_ids([self])
    }
}

/// Adapts a function of the test point into a [`TimeDerivativeCoefficient`].
#[derive(Debug, Clone, Copy)]
pub struct CoefficientFn<F>(pub F);

impl<T, D, F> TimeDerivativeCoefficient<T, D> for CoefficientFn<F>
where
    T: Real,
    D: DimName,
    F: Fn(&TestPoint<T, D>) -> T + Send + Sync,
    DefaultAllocator: Allocator<T, D>,
{
    fn coefficient(&self, point: &TestPoint<T, D>) -> T {
        (self.0)(point)
    }
}

/// The term $\psi_i c \dot u$ for a coefficient $c$.
///
/// The coefficient is treated as independent of the primary unknown, so the Jacobian is
/// $\psi_i c \phi_j \partial \dot u / \partial u$.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientTimeDerivative<C> {
    coefficient: C,
}

impl<C> CoefficientTimeDerivative<C> {
    pub fn new(coefficient: C) -> Self {
        Self { coefficient }
    }

    pub fn coefficient(&self) -> &C {
        &self.coefficient
    }
}

impl<T, D, C> Kernel<T, D> for CoefficientTimeDerivative<C>
where
    T: Real,
    D: DimName,
    C: TimeDerivativeCoefficient<T, D>,
    DefaultAllocator: Allocator<T, D>,
{
    fn name(&self) -> &'static str {
        "CoefTimeDerivative"
    }

    fn coupled_variables(&self) -> Vec<VariableId> {
        self.coefficient.coupled_variables()
    }

    fn residual_at(&self, p: &TestPoint<T, D>) -> T {
        p.test * self.coefficient.coefficient(p) * p.u_dot()
    }

    fn jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>) -> T {
        p.test * self.coefficient.coefficient(p) * trial.phi * p.fields.du_dot_du()
    }
}
