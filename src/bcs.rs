//! Boundary kernels.
mod thermal_fluid_flux;

pub use thermal_fluid_flux::*;
