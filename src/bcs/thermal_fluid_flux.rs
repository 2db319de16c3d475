use crate::kernel::{Kernel, TestPoint, TrialPoint};
use crate::kernels::{coupled_variable_ids, velocity_at, velocity_direction};
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName};
use crate::variable::{Coupled, VariableId};
use crate::Real;

/// Advective heat flux through the domain boundary.
///
/// Residual: $\psi_i (\vec v \cdot \vec n) f_v \rho c_p T_b$, where $T_b$ is the temperature
/// of the domain where fluid leaves it ($\vec v \cdot \vec n > 0$) and the prescribed outside
/// temperature where fluid enters.
///
/// This is the boundary term of
/// [`HeatAdvectionConservative`](crate::kernels::HeatAdvectionConservative), and must be
/// applied together with it wherever the boundary is open.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalFluidFluxBC<T> {
    density: Coupled<T>,
    heat_capacity: Coupled<T>,
    volume_fraction: Coupled<T>,
    velocity: [Coupled<T>; 3],
    outside_temperature: Coupled<T>,
}

/// Which side of the boundary the transported temperature is taken from.
enum FlowDirection {
    Outflow,
    Inflow,
}

impl<T: Real> ThermalFluidFluxBC<T> {
    pub fn new(
        density: Coupled<T>,
        heat_capacity: Coupled<T>,
        velocity: [Coupled<T>; 3],
        outside_temperature: Coupled<T>,
    ) -> Self {
        Self {
            density,
            heat_capacity,
            volume_fraction: Coupled::one(),
            velocity,
            outside_temperature,
        }
    }

    pub fn with_volume_fraction(self, volume_fraction: Coupled<T>) -> Self {
        Self {
            volume_fraction,
            ..self
        }
    }

    /// Normal velocity and flow direction at a point.
    fn normal_flow<D>(&self, p: &TestPoint<T, D>) -> (T, FlowDirection)
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        let normal_velocity = match p.normal {
            Some(normal) => velocity_at(&self.velocity, p).dot(normal),
            None => T::zero(),
        };
        if normal_velocity > T::zero() {
            (normal_velocity, FlowDirection::Outflow)
        } else {
            (normal_velocity, FlowDirection::Inflow)
        }
    }

    /// The temperature carried across the boundary.
    fn upwind_temperature<D>(&self, p: &TestPoint<T, D>, direction: &FlowDirection) -> T
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        match direction {
            FlowDirection::Outflow => p.u(),
            FlowDirection::Inflow => p.coupled(&self.outside_temperature),
        }
    }
}

impl<T, D> Kernel<T, D> for ThermalFluidFluxBC<T>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn name(&self) -> &'static str {
        "ThermalFluidFluxBC"
    }

    fn coupled_variables(&self) -> Vec<VariableId> {
        let velocity = self.velocity.iter().take(D::dim());
        coupled_variable_ids(
            [
                &self.density,
                &self.heat_capacity,
                &self.volume_fraction,
                &self.outside_temperature,
            ]
            .into_iter()
            .chain(velocity),
        )
    }

    fn requires_normals(&self) -> bool {
        true
    }

    fn residual_at(&self, p: &TestPoint<T, D>) -> T {
        let (vn, direction) = self.normal_flow(p);
        let temperature = self.upwind_temperature(p, &direction);
        p.test
            * vn
            * temperature
            * p.coupled(&self.density)
            * p.coupled(&self.heat_capacity)
            * p.coupled(&self.volume_fraction)
    }

    fn jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>) -> T {
        match self.normal_flow(p) {
            (vn, FlowDirection::Outflow) => {
                p.test
                    * vn
                    * trial.phi
                    * p.coupled(&self.density)
                    * p.coupled(&self.heat_capacity)
                    * p.coupled(&self.volume_fraction)
            }
            // The outside temperature does not depend on the unknown
            (_, FlowDirection::Inflow) => T::zero(),
        }
    }

    fn off_diagonal_jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>, jvar: VariableId) -> T {
        let Some(normal) = p.normal else {
            return T::zero();
        };
        let (vn, direction) = self.normal_flow(p);
        let temperature = self.upwind_temperature(p, &direction);
        let rho = p.coupled(&self.density);
        let cp = p.coupled(&self.heat_capacity);
        let fv = p.coupled(&self.volume_fraction);

        if let Some(k) = velocity_direction(&self.velocity, D::dim(), jvar) {
            return p.test * temperature * (trial.phi * normal[k]) * rho * cp * fv;
        }

        if self.outside_temperature.is(jvar) {
            match direction {
                FlowDirection::Outflow => T::zero(),
                FlowDirection::Inflow => p.test * vn * trial.phi * rho * cp * fv,
            }
        } else if self.density.is(jvar) {
            p.test * vn * temperature * trial.phi * cp * fv
        } else if self.heat_capacity.is(jvar) {
            p.test * vn * temperature * rho * trial.phi * fv
        } else if self.volume_fraction.is(jvar) {
            p.test * vn * temperature * rho * cp * trial.phi
        } else {
            T::zero()
        }
    }
}
