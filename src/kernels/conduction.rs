use crate::kernel::{Kernel, TestPoint, TrialPoint};
use crate::kernels::coupled_variable_ids;
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName};
use crate::variable::{Coupled, VariableId};
use crate::Real;

/// Conduction of heat through a phase occupying a fraction of the volume.
///
/// Residual: $f_v k \nabla \psi_i \cdot \nabla T$, with conductivity $k$ (W/m/K) and
/// volume fraction $f_v$.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatConduction<T> {
    conductivity: Coupled<T>,
    volume_fraction: Coupled<T>,
}

impl<T: Real> HeatConduction<T> {
    pub fn new(conductivity: Coupled<T>) -> Self {
        Self {
            conductivity,
            volume_fraction: Coupled::one(),
        }
    }

    pub fn with_volume_fraction(self, volume_fraction: Coupled<T>) -> Self {
        Self {
            volume_fraction,
            ..self
        }
    }
}

impl<T, D> Kernel<T, D> for HeatConduction<T>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn name(&self) -> &'static str {
        "HeatConduction"
    }

    fn coupled_variables(&self) -> Vec<VariableId> {
        coupled_variable_ids([&self.conductivity, &self.volume_fraction])
    }

    fn residual_at(&self, p: &TestPoint<T, D>) -> T {
        p.coupled(&self.volume_fraction) * p.coupled(&self.conductivity) * p.grad_test.dot(p.grad_u())
    }

    fn jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>) -> T {
        p.coupled(&self.volume_fraction) * p.coupled(&self.conductivity) * p.grad_test.dot(trial.grad_phi)
    }

    fn off_diagonal_jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>, jvar: VariableId) -> T {
        let flux = p.grad_test.dot(p.grad_u());
        if self.conductivity.is(jvar) {
            p.coupled(&self.volume_fraction) * trial.phi * flux
        } else if self.volume_fraction.is(jvar) {
            trial.phi * p.coupled(&self.conductivity) * flux
        } else {
            T::zero()
        }
    }
}
