use crate::element::ElementValues;
use crate::fields::FieldAccessor;
use crate::kernel::{
    assemble_local_jacobian, assemble_local_residual, validate_kernel_inputs, Kernel, TestPoint, TrialPoint,
};
use crate::kernels::{coupled_variable_ids, velocity_at, velocity_direction};
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DMatrixViewMut, DVectorViewMut, DefaultAllocator, DimName};
use crate::variable::{Coupled, VariableId};
use crate::Real;
use davenport::{define_thread_local_workspace, with_thread_local_workspace};
use eyre::eyre;
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Stabilization of the advective term.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Upwinding {
    /// Centered discretization. Overshoots and undershoots may appear, but numerical
    /// diffusion is minimal.
    #[default]
    None,
    /// Full upwinding. Overshoots and undershoots are avoided at the price of large
    /// numerical diffusion.
    Full,
}

/// Advection of heat in conservative (divergence) form.
///
/// Residual: $-\nabla \psi_i \cdot \vec v f_v \rho c_p T$.
///
/// Integrating by parts moves the boundary term onto
/// [`ThermalFluidFluxBC`](crate::bcs::ThermalFluidFluxBC), which must be applied on every
/// boundary where the flux is not otherwise prescribed.
///
/// # Full upwinding
///
/// With [`Upwinding::Full`] the element contribution is replaced as follows. The raw nodal
/// outflow $R_n = \int -\nabla \psi_n \cdot \vec v f_v \rho c_p$ classifies node $n$ as
/// upwind ($R_n \geq 0$) or downwind. Upwind nodes contribute $R_n T_n$, using their own
/// nodal temperature. The total outflow $\sum_{up} R_n T_n$ is then handed to the downwind
/// nodes in proportion to $R_n$, so the element contributions sum to zero exactly as
/// the centered ones do.
///
/// If downwind nodes exist but their total inflow is numerically zero, or if there is
/// outflow without any downwind node, the redistribution is skipped, a warning is logged
/// and [`degenerate_redistributions`](Self::degenerate_redistributions) is incremented.
///
/// The full upwind Jacobian is only defined when the test and trial spaces have the same
/// number of functions. Otherwise the Jacobian is left zero and
/// [`mismatched_space_jacobians`](Self::mismatched_space_jacobians) is incremented.
#[derive(Debug)]
pub struct HeatAdvectionConservative<T> {
    density: Coupled<T>,
    heat_capacity: Coupled<T>,
    volume_fraction: Coupled<T>,
    velocity: [Coupled<T>; 3],
    upwinding: Upwinding,
    degenerate_redistributions: AtomicUsize,
    mismatched_space_jacobians: AtomicUsize,
}

/// Scratch buffers for one full upwind pass.
#[derive(Debug)]
struct UpwindWorkspace<T> {
    outflow: Vec<T>,
    upwind: Vec<bool>,
    dtotal_out: Vec<T>,
}

impl<T> Default for UpwindWorkspace<T> {
    fn default() -> Self {
        Self {
            outflow: Vec::new(),
            upwind: Vec::new(),
            dtotal_out: Vec::new(),
        }
    }
}

define_thread_local_workspace!(WORKSPACE);

impl<T: Real> HeatAdvectionConservative<T> {
    pub fn new(density: Coupled<T>, heat_capacity: Coupled<T>, velocity: [Coupled<T>; 3]) -> Self {
        Self {
            density,
            heat_capacity,
            volume_fraction: Coupled::one(),
            velocity,
            upwinding: Upwinding::None,
            degenerate_redistributions: AtomicUsize::new(0),
            mismatched_space_jacobians: AtomicUsize::new(0),
        }
    }

    pub fn with_volume_fraction(self, volume_fraction: Coupled<T>) -> Self {
        Self {
            volume_fraction,
            ..self
        }
    }

    pub fn with_upwinding(self, upwinding: Upwinding) -> Self {
        Self { upwinding, ..self }
    }

    pub fn upwinding(&self) -> Upwinding {
        self.upwinding
    }

    /// Number of full upwind evaluations in which the outflow could not be redistributed.
    pub fn degenerate_redistributions(&self) -> usize {
        self.degenerate_redistributions.load(Ordering::Relaxed)
    }

    /// Number of full upwind Jacobians requested with differing test and trial spaces.
    pub fn mismatched_space_jacobians(&self) -> usize {
        self.mismatched_space_jacobians.load(Ordering::Relaxed)
    }

    fn volumetric_heat_capacity<D>(&self, p: &TestPoint<T, D>) -> T
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        p.coupled(&self.density) * p.coupled(&self.heat_capacity) * p.coupled(&self.volume_fraction)
    }

    /// $-(\nabla \psi_i \cdot \vec v) \rho c_p f_v$
    fn negative_speed<D>(&self, p: &TestPoint<T, D>) -> T
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let velocity = velocity_at(&self.velocity, p);
        -p.grad_test.dot(&velocity) * self.volumetric_heat_capacity(p)
    }

    /// Computes the raw outflow of every node and whether the node is upwind.
    ///
    /// The classification only depends on the velocity field and the geometry, so the
    /// residual and the Jacobian always agree on it.
    fn classify_nodes<D>(
        &self,
        element: &ElementValues<T, D>,
        fields: &dyn FieldAccessor<T, D>,
        outflow: &mut Vec<T>,
        upwind: &mut Vec<bool>,
    ) where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let num_nodes = element.test().num_functions();
        let quadrature = element.quadrature();
        outflow.clear();
        outflow.resize(num_nodes, T::zero());
        upwind.clear();
        upwind.resize(num_nodes, false);

        for n in 0..num_nodes {
            for qp in 0..quadrature.len() {
                let point = TestPoint::new(element, fields, n, qp);
                outflow[n] += quadrature.weight(qp) * self.negative_speed(&point);
            }
            upwind[n] = outflow[n] >= T::zero();
        }
    }

    /// Decides whether the total inflow can carry the outflow, recording the occasions
    /// where it cannot.
    fn redistribution_is_degenerate(&self, outflow: &[T], upwind: &[bool], total_in: T) -> bool {
        let has_downwind = upwind.iter().any(|is_upwind| !is_upwind);
        let scale = outflow
            .iter()
            .fold(T::zero(), |acc, &r| acc + r.abs());
        let degenerate = if has_downwind {
            total_in <= T::default_epsilon() * scale
        } else {
            scale > T::zero()
        };

        if degenerate {
            self.degenerate_redistributions
                .fetch_add(1, Ordering::Relaxed);
            warn!(
                "HeatAdvectionConservative: total inflow {} cannot absorb outflow (total nodal outflow magnitude {}), \
                 skipping full upwind redistribution",
                total_in, scale
            );
        }
        degenerate
    }

    fn full_upwind_residual<D>(
        &self,
        element: &ElementValues<T, D>,
        fields: &dyn FieldAccessor<T, D>,
        mut output: DVectorViewMut<T>,
    ) -> eyre::Result<()>
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let num_nodes = element.test().num_functions();
        assert_eq!(output.len(), num_nodes, "Output vector must have one entry per test function");
        validate_kernel_inputs(self, element, fields)?;
        let nodal_u = fields.nodal_u();
        if nodal_u.len() != num_nodes {
            return Err(eyre!(
                "full upwinding needs one nodal value per test function, got {} values for {} functions",
                nodal_u.len(),
                num_nodes
            ));
        }

        with_thread_local_workspace(&WORKSPACE, |ws: &mut UpwindWorkspace<T>| {
            self.classify_nodes(element, fields, &mut ws.outflow, &mut ws.upwind);

            let mut total_out = T::zero();
            let mut total_in = T::zero();
            for n in 0..num_nodes {
                if ws.upwind[n] {
                    output[n] = ws.outflow[n] * nodal_u[n];
                    total_out += output[n];
                } else {
                    output[n] = ws.outflow[n];
                    total_in -= ws.outflow[n];
                }
            }

            if self.redistribution_is_degenerate(&ws.outflow, &ws.upwind, total_in) {
                return;
            }

            // Hand the outflow to the downwind nodes in proportion to their raw inflow
            for n in 0..num_nodes {
                if !ws.upwind[n] {
                    output[n] = ws.outflow[n] * total_out / total_in;
                }
            }
        });
        Ok(())
    }

    fn full_upwind_jacobian<D>(
        &self,
        element: &ElementValues<T, D>,
        fields: &dyn FieldAccessor<T, D>,
        mut output: DMatrixViewMut<T>,
    ) -> eyre::Result<()>
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let num_nodes = element.test().num_functions();
        let num_trial = element.trial().num_functions();
        assert_eq!(output.nrows(), num_nodes, "Output matrix must have one row per test function");
        assert_eq!(output.ncols(), num_trial, "Output matrix must have one column per trial function");
        validate_kernel_inputs(self, element, fields)?;
        output.fill(T::zero());

        if !element.has_matching_spaces() {
            self.mismatched_space_jacobians
                .fetch_add(1, Ordering::Relaxed);
            warn!(
                "HeatAdvectionConservative: full upwind Jacobian requires equal test and trial spaces \
                 ({} test vs. {} trial functions), leaving it empty",
                num_nodes, num_trial
            );
            return Ok(());
        }

        with_thread_local_workspace(&WORKSPACE, |ws: &mut UpwindWorkspace<T>| {
            self.classify_nodes(element, fields, &mut ws.outflow, &mut ws.upwind);
            ws.dtotal_out.clear();
            ws.dtotal_out.resize(num_nodes, T::zero());

            let mut total_in = T::zero();
            for n in 0..num_nodes {
                if ws.upwind[n] {
                    // The nodal value at n only depends on the degree of freedom at n
                    output[(n, n)] += ws.outflow[n];
                    ws.dtotal_out[n] = ws.outflow[n];
                } else {
                    total_in -= ws.outflow[n];
                }
            }

            if self.redistribution_is_degenerate(&ws.outflow, &ws.upwind, total_in) {
                return;
            }

            for n in 0..num_nodes {
                if !ws.upwind[n] {
                    for j in 0..num_nodes {
                        output[(n, j)] += ws.outflow[n] * ws.dtotal_out[j] / total_in;
                    }
                }
            }
        });
        Ok(())
    }
}

impl<T, D> Kernel<T, D> for HeatAdvectionConservative<T>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn name(&self) -> &'static str {
        "HeatAdvectionConservative"
    }

    fn coupled_variables(&self) -> Vec<VariableId> {
        let velocity = self.velocity.iter().take(D::dim());
        coupled_variable_ids(
            [&self.density, &self.heat_capacity, &self.volume_fraction]
                .into_iter()
                .chain(velocity),
        )
    }

    fn residual_at(&self, p: &TestPoint<T, D>) -> T {
        self.negative_speed(p) * p.u()
    }

    fn jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>) -> T {
        self.negative_speed(p) * trial.phi
    }

    fn off_diagonal_jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>, jvar: VariableId) -> T {
        let rho = p.coupled(&self.density);
        let cp = p.coupled(&self.heat_capacity);
        let fv = p.coupled(&self.volume_fraction);

        if let Some(k) = velocity_direction(&self.velocity, D::dim(), jvar) {
            return -p.u() * (trial.phi * p.grad_test[k]) * rho * cp * fv;
        }

        let flux = p.grad_test.dot(&velocity_at(&self.velocity, p));
        if self.density.is(jvar) {
            -p.u() * flux * trial.phi * cp * fv
        } else if self.heat_capacity.is(jvar) {
            -p.u() * flux * rho * trial.phi * fv
        } else if self.volume_fraction.is(jvar) {
            -p.u() * flux * rho * cp * trial.phi
        } else {
            T::zero()
        }
    }

    fn compute_residual(
        &self,
        element: &ElementValues<T, D>,
        fields: &dyn FieldAccessor<T, D>,
        output: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        match self.upwinding {
            Upwinding::None => assemble_local_residual(self, element, fields, output),
            Upwinding::Full => self.full_upwind_residual(element, fields, output),
        }
    }

    fn compute_jacobian(
        &self,
        element: &ElementValues<T, D>,
        fields: &dyn FieldAccessor<T, D>,
        output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        match self.upwinding {
            Upwinding::None => assemble_local_jacobian(self, element, fields, output),
            Upwinding::Full => self.full_upwind_jacobian(element, fields, output),
        }
    }
}
