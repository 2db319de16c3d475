//! Errors raised when a kernel is evaluated with inconsistent inputs.
use crate::variable::VariableId;
use std::error::Error;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Violation of the contract between a kernel and the data it is evaluated with.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KernelError {
    /// The field accessor does not provide a variable the kernel is coupled to.
    MissingCoupledVariable { kernel: &'static str, variable: VariableId },
    /// A boundary kernel was evaluated without outward normals.
    MissingNormals { kernel: &'static str },
    /// The number of quadrature points in the element data and the field data differ.
    QuadratureMismatch { element_points: usize, field_points: usize },
}

impl Display for KernelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCoupledVariable { kernel, variable } => {
                write!(f, "{} is coupled to variable {} but no values were provided for it", kernel, variable.0)
            }
            Self::MissingNormals { kernel } => {
                write!(f, "{} must be evaluated on a facet with outward normals", kernel)
            }
            Self::QuadratureMismatch {
                element_points,
                field_points,
            } => {
                write!(
                    f,
                    "element data has {} quadrature points but field data has {}",
                    element_points, field_points
                )
            }
        }
    }
}

impl Error for KernelError {}
