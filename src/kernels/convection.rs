use crate::kernel::{Kernel, TestPoint, TrialPoint};
use crate::kernels::coupled_variable_ids;
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName};
use crate::variable::{Coupled, VariableId};
use crate::Real;

/// Exchange of heat between two phases sharing the same domain.
///
/// Residual: $\psi_i h A f_v (T - T_o)$, where $h$ is the heat transfer coefficient
/// (W/m^2/K), $A$ the specific contact area between the phases (m^-1), $f_v$ the volume
/// fraction and $T_o$ the temperature of the other phase.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatConvection<T> {
    coefficient: Coupled<T>,
    other_temperature: Coupled<T>,
    specific_area: Coupled<T>,
    volume_fraction: Coupled<T>,
}

impl<T: Real> HeatConvection<T> {
    pub fn new(coefficient: Coupled<T>, other_temperature: Coupled<T>, specific_area: Coupled<T>) -> Self {
        Self {
            coefficient,
            other_temperature,
            specific_area,
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

impl<T, D> Kernel<T, D> for HeatConvection<T>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn name(&self) -> &'static str {
        "HeatConvection"
    }

    fn coupled_variables(&self) -> Vec<VariableId> {
        coupled_variable_ids([
            &self.coefficient,
            &self.other_temperature,
            &self.specific_area,
            &self.volume_fraction,
        ])
    }

    fn residual_at(&self, p: &TestPoint<T, D>) -> T {
        let h = p.coupled(&self.coefficient);
        let area = p.coupled(&self.specific_area);
        let fv = p.coupled(&self.volume_fraction);
        p.test * h * area * fv * (p.u() - p.coupled(&self.other_temperature))
    }

    fn jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>) -> T {
        let h = p.coupled(&self.coefficient);
        let area = p.coupled(&self.specific_area);
        let fv = p.coupled(&self.volume_fraction);
        p.test * h * area * fv * trial.phi
    }

    fn off_diagonal_jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>, jvar: VariableId) -> T {
        let h = p.coupled(&self.coefficient);
        let area = p.coupled(&self.specific_area);
        let fv = p.coupled(&self.volume_fraction);
        let difference = p.u() - p.coupled(&self.other_temperature);

        if self.other_temperature.is(jvar) {
            -p.test * h * area * fv * trial.phi
        } else if self.coefficient.is(jvar) {
            p.test * trial.phi * area * fv * difference
        } else if self.volume_fraction.is(jvar) {
            p.test * h * area * trial.phi * difference
        } else if self.specific_area.is(jvar) {
            p.test * h * trial.phi * fv * difference
        } else {
            T::zero()
        }
    }
}
