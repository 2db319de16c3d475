use crate::kernel::{Kernel, TestPoint, TrialPoint};
use crate::kernels::{coupled_variable_ids, CoefficientTimeDerivative, TimeDerivativeCoefficient};
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName};
use crate::variable::{Coupled, VariableId};
use crate::Real;

/// The volumetric heat capacity $f_v \rho c_p$ of a phase.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumetricHeatCapacity<T> {
    pub density: Coupled<T>,
    pub heat_capacity: Coupled<T>,
    pub volume_fraction: Coupled<T>,
}

impl<T, D> TimeDerivativeCoefficient<T, D> for VolumetricHeatCapacity<T>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn coefficient(&self, p: &TestPoint<T, D>) -> T {
        p.coupled(&self.density) * p.coupled(&self.heat_capacity) * p.coupled(&self.volume_fraction)
    }

    fn coupled_variables(&self) -> Vec<VariableId> {
        coupled_variable_ids([&self.density, &self.heat_capacity, &self.volume_fraction])
    }
}

/// Accumulation of heat in a phase.
///
/// Residual: $\psi_i f_v \rho c_p \dot T$, with density $\rho$ (kg/m^3), heat capacity
/// $c_p$ (J/kg/K) and volume fraction $f_v$.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatAccumulation<T> {
    storage: CoefficientTimeDerivative<VolumetricHeatCapacity<T>>,
}

impl<T: Real> HeatAccumulation<T> {
    pub fn new(density: Coupled<T>, heat_capacity: Coupled<T>) -> Self {
        Self {
            storage: CoefficientTimeDerivative::new(VolumetricHeatCapacity {
                density,
                heat_capacity,
                volume_fraction: Coupled::one(),
            }),
        }
    }

    pub fn with_volume_fraction(self, volume_fraction: Coupled<T>) -> Self {
        let capacity = self.storage.coefficient();
        Self {
            storage: CoefficientTimeDerivative::new(VolumetricHeatCapacity {
                volume_fraction,
                ..capacity.clone()
            }),
        }
    }

    fn capacity(&self) -> &VolumetricHeatCapacity<T> {
        self.storage.coefficient()
    }
}

impl<T, D> Kernel<T, D> for HeatAccumulation<T>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn name(&self) -> &'static str {
        "HeatAccumulation"
    }

    fn coupled_variables(&self) -> Vec<VariableId> {
        Kernel::<T, D>::coupled_variables(&self.storage)
    }

    fn residual_at(&self, p: &TestPoint<T, D>) -> T {
        self.storage.residual_at(p)
    }

    fn jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>) -> T {
        self.storage.jacobian_at(p, trial)
    }

    fn off_diagonal_jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>, jvar: VariableId) -> T {
        let VolumetricHeatCapacity {
            density,
            heat_capacity,
            volume_fraction,
        } = self.capacity();
        let rate = p.test * p.u_dot();

        if density.is(jvar) {
            trial.phi * p.coupled(heat_capacity) * p.coupled(volume_fraction) * rate
        } else if heat_capacity.is(jvar) {
            p.coupled(density) * trial.phi * p.coupled(volume_fraction) * rate
        } else if volume_fraction.is(jvar) {
            p.coupled(density) * p.coupled(heat_capacity) * trial.phi * rate
        } else {
            T::zero()
        }
    }
}
