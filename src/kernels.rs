//! Volumetric kernels of the energy balance.
//!
//! | Kernel | Residual |
//! |---|---|
//! | [`HeatConduction`] | $f_v k \nabla \psi_i \cdot \nabla T$ |
//! | [`HeatConvection`] | $\psi_i h A f_v (T - T_o)$ |
//! | [`HeatAccumulation`] | $\psi_i f_v \rho c_p \dot T$ |
//! | [`HeatSource`] | $-\psi_i Q$ |
//! | [`HeatAdvectionConservative`] | $-\nabla \psi_i \cdot \vec v f_v \rho c_p T$ |
use crate::kernel::TestPoint;
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName, OVector};
use crate::variable::{Coupled, VariableId};
use crate::Real;

mod accumulation;
mod advection;
mod conduction;
mod convection;
mod source;
mod time_derivative;

pub use accumulation::*;
pub use advection::*;
pub use conduction::*;
pub use convection::*;
pub use source::*;
pub use time_derivative::*;

/// Collects the variables among a set of coupled inputs, without duplicates.
pub(crate) fn coupled_variable_ids<'a, T: Real + 'a>(inputs: impl IntoIterator<Item = &'a Coupled<T>>) -> Vec<VariableId> {
    let mut ids: Vec<VariableId> = inputs
        .into_iter()
        .filter_map(Coupled::variable)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Assembles the velocity vector from its components at a point.
///
/// Only the first `D` components are used.
pub(crate) fn velocity_at<T, D>(velocity: &[Coupled<T>; 3], point: &TestPoint<T, D>) -> OVector<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    OVector::<T, D>::from_fn(|k, _| {
        velocity
            .get(k)
            .map(|component| point.coupled(component))
            .unwrap_or_else(T::zero)
    })
}

/// The direction whose velocity component is the variable `jvar`, if any.
pub(crate) fn velocity_direction<T: Real>(velocity: &[Coupled<T>; 3], dim: usize, jvar: VariableId) -> Option<usize> {
    velocity
        .iter()
        .take(dim)
        .position(|component| component.is(jvar))
}
