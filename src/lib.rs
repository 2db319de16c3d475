//! Finite element kernels for thermal transport in multiphase media.
//!
//! Each kernel contributes local residual and Jacobian entries for one term of an energy
//! balance: conduction, interphase convection, accumulation, volumetric sources and
//! conservative advection, together with the boundary flux term that the conservative
//! advection form requires. Kernels are evaluated per quadrature point through the
//! [`Kernel`](kernel::Kernel) interface and driven by a shared local quadrature loop.
use nalgebra::RealField;

pub mod assembly;
pub mod bcs;
pub mod config;
pub mod element;
pub mod error;
pub mod fields;
pub mod kernel;
pub mod kernels;
pub mod quadrature;
pub mod variable;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// A real scalar type usable in kernel computations.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
