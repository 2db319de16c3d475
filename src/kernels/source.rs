use crate::kernel::{Kernel, TestPoint, TrialPoint};
use crate::kernels::coupled_variable_ids;
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName};
use crate::variable::{Coupled, VariableId};
use crate::Real;

/// A volumetric heat source (or sink, if negative) given by a coupled variable (W/m^3).
#[derive(Debug, Clone, PartialEq)]
pub struct HeatSource<T> {
    source: Coupled<T>,
}

impl<T: Real> HeatSource<T> {
    pub fn new(source: Coupled<T>) -> Self {
        Self { source }
    }
}

impl<T, D> Kernel<T, D> for HeatSource<T>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn name(&self) -> &'static str {
        "HeatSource"
    }

    fn coupled_variables(&self) -> Vec<VariableId> {
        coupled_variable_ids([&self.source])
    }

    fn residual_at(&self, p: &TestPoint<T, D>) -> T {
        -p.test * p.coupled(&self.source)
    }

    fn jacobian_at(&self, _p: &TestPoint<T, D>, _trial: &TrialPoint<T, D>) -> T {
        T::zero()
    }

    fn off_diagonal_jacobian_at(&self, p: &TestPoint<T, D>, trial: &TrialPoint<T, D>, jvar: VariableId) -> T {
        if self.source.is(jvar) {
            -p.test * trial.phi
        } else {
            T::zero()
        }
    }
}
