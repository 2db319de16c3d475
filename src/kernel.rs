//! The kernel interface and the local quadrature loop shared by all kernels.
//!
//! A kernel describes one term of a weak form through its integrand: the residual
//! contribution of test function `i` at a quadrature point, and the derivatives of that
//! contribution with respect to the coefficient of trial function `j`. The functions
//! [`assemble_local_residual`], [`assemble_local_jacobian`] and
//! [`assemble_local_off_diagonal_jacobian`] integrate these over an element or facet.
//! Kernels that need more than a per-point integrand override the element-level methods
//! of [`Kernel`] instead.
use crate::element::ElementValues;
use crate::error::KernelError;
use crate::fields::FieldAccessor;
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DMatrixViewMut, DVectorViewMut, DefaultAllocator, DimName, OVector};
use crate::variable::{Coupled, VariableId};
use crate::Real;

/// A test function evaluated at a quadrature point, together with the field state there.
pub struct TestPoint<'a, T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Index of the test function.
    pub i: usize,
    /// Index of the quadrature point.
    pub qp: usize,
    pub test: T,
    pub grad_test: &'a OVector<T, D>,
    /// Outward unit normal, present only on facets.
    pub normal: Option<&'a OVector<T, D>>,
    pub fields: &'a dyn FieldAccessor<T, D>,
}

impl<'a, T, D> TestPoint<'a, T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn new(element: &'a ElementValues<T, D>, fields: &'a dyn FieldAccessor<T, D>, i: usize, qp: usize) -> Self {
        Self {
            i,
            qp,
            test: element.test().value(i, qp),
            grad_test: element.test().gradient(i, qp),
            normal: element.quadrature().normal(qp),
            fields,
        }
    }

    pub fn u(&self) -> T {
        self.fields.u(self.qp)
    }

    pub fn grad_u(&self) -> &OVector<T, D> {
        self.fields.grad_u(self.qp)
    }

    pub fn u_dot(&self) -> T {
        self.fields.u_dot(self.qp)
    }

    /// Value of a coupled input at this point.
    pub fn coupled(&self, input: &Coupled<T>) -> T {
        input.value(self.fields, self.qp)
    }
}

/// A trial function evaluated at a quadrature point.
pub struct TrialPoint<'a, T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Index of the trial function.
    pub j: usize,
    pub phi: T,
    pub grad_phi: &'a OVector<T, D>,
}

impl<'a, T, D> TrialPoint<'a, T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn new(element: &'a ElementValues<T, D>, j: usize, qp: usize) -> Self {
        Self {
            j,
            phi: element.trial().value(j, qp),
            grad_phi: element.trial().gradient(j, qp),
        }
    }
}

/// One term of a weak form, contributing local residual and Jacobian entries.
///
/// The per-point methods define the integrand. The element-level methods integrate it
/// with the shared quadrature loop unless overridden.
pub trait Kernel<T, D>: Send + Sync
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Name under which the kernel is registered.
    fn name(&self) -> &'static str;

    /// Variables that must be provided by the field accessor.
    fn coupled_variables(&self) -> Vec<VariableId>;

    /// Whether the kernel must be evaluated on facets with outward normals.
    fn requires_normals(&self) -> bool {
        false
    }

    fn residual_at(&self, point: &TestPoint<T, D>) -> T;

    /// Derivative of the residual with respect to the primary unknown.
    fn jacobian_at(&self, point: &TestPoint<T, D>, trial: &TrialPoint<T, D>) -> T;

    /// Derivative of the residual with respect to the coupled variable `jvar`.
    fn off_diagonal_jacobian_at(&self, point: &TestPoint<T, D>, trial: &TrialPoint<T, D>, jvar: VariableId) -> T {
        let _ = (point, trial, jvar);
        T::zero()
    }

    fn compute_residual(
        &self,
        element: &ElementValues<T, D>,
        fields: &dyn FieldAccessor<T, D>,
        output: DVectorViewMut<T>,
    ) -> eyre::Result<()> {
        assemble_local_residual(self, element, fields, output)
    }

    fn compute_jacobian(
        &self,
        element: &ElementValues<T, D>,
        fields: &dyn FieldAccessor<T, D>,
        output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        assemble_local_jacobian(self, element, fields, output)
    }

    fn compute_off_diagonal_jacobian(
        &self,
        element: &ElementValues<T, D>,
        fields: &dyn FieldAccessor<T, D>,
        jvar: VariableId,
        output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        assemble_local_off_diagonal_jacobian(self, element, fields, jvar, output)
    }
}

/// Checks that the element and field data are consistent with what the kernel needs.
pub fn validate_kernel_inputs<T, D, K>(
    kernel: &K,
    element: &ElementValues<T, D>,
    fields: &dyn FieldAccessor<T, D>,
) -> eyre::Result<()>
where
    T: Real,
    D: DimName,
    K: Kernel<T, D> + ?Sized,
    DefaultAllocator: Allocator<T, D>,
{
    if element.num_points() != fields.num_quadrature_points() {
        return Err(KernelError::QuadratureMismatch {
            element_points: element.num_points(),
            field_points: fields.num_quadrature_points(),
        }
        .into());
    }
    if kernel.requires_normals() && !element.quadrature().has_normals() {
        return Err(KernelError::MissingNormals { kernel: kernel.name() }.into());
    }
    if let Some(variable) = kernel
        .coupled_variables()
        .into_iter()
        .find(|&id| !fields.has_coupled(id))
    {
        return Err(KernelError::MissingCoupledVariable {
            kernel: kernel.name(),
            variable,
        }
        .into());
    }
    Ok(())
}

/// Integrates the residual of a kernel over an element.
///
/// The output is overwritten with the entry for each test function.
///
/// # Panics
///
/// Panics if the output length differs from the number of test functions.
pub fn assemble_local_residual<T, D, K>(
    kernel: &K,
    element: &ElementValues<T, D>,
    fields: &dyn FieldAccessor<T, D>,
    mut output: DVectorViewMut<T>,
) -> eyre::Result<()>
where
    T: Real,
    D: DimName,
    K: Kernel<T, D> + ?Sized,
    DefaultAllocator: Allocator<T, D>,
{
    let num_test = element.test().num_functions();
    assert_eq!(output.len(), num_test, "Output vector must have one entry per test function");
    validate_kernel_inputs(kernel, element, fields)?;

    output.fill(T::zero());
    let quadrature = element.quadrature();
    for i in 0..num_test {
        for qp in 0..quadrature.len() {
            let point = TestPoint::new(element, fields, i, qp);
            output[i] += quadrature.weight(qp) * kernel.residual_at(&point);
        }
    }
    Ok(())
}

/// Integrates the derivative of the residual with respect to the primary unknown.
///
/// # Panics
///
/// Panics if the output is not `n_test x n_trial`.
pub fn assemble_local_jacobian<T, D, K>(
    kernel: &K,
    element: &ElementValues<T, D>,
    fields: &dyn FieldAccessor<T, D>,
    output: DMatrixViewMut<T>,
) -> eyre::Result<()>
where
    T: Real,
    D: DimName,
    K: Kernel<T, D> + ?Sized,
    DefaultAllocator: Allocator<T, D>,
{
    assemble_local_matrix(kernel, element, fields, output, |point, trial| kernel.jacobian_at(point, trial))
}

/// Integrates the derivative of the residual with respect to the coupled variable `jvar`.
///
/// # Panics
///
/// Panics if the output is not `n_test x n_trial`.
pub fn assemble_local_off_diagonal_jacobian<T, D, K>(
    kernel: &K,
    element: &ElementValues<T, D>,
    fields: &dyn FieldAccessor<T, D>,
    jvar: VariableId,
    output: DMatrixViewMut<T>,
) -> eyre::Result<()>
where
    T: Real,
    D: DimName,
    K: Kernel<T, D> + ?Sized,
    DefaultAllocator: Allocator<T, D>,
{
    assemble_local_matrix(kernel, element, fields, output, |point, trial| {
        kernel.off_diagonal_jacobian_at(point, trial, jvar)
    })
}

fn assemble_local_matrix<T, D, K, F>(
    kernel: &K,
    element: &ElementValues<T, D>,
    fields: &dyn FieldAccessor<T, D>,
    mut output: DMatrixViewMut<T>,
    integrand: F,
) -> eyre::Result<()>
where
    T: Real,
    D: DimName,
    K: Kernel<T, D> + ?Sized,
    F: Fn(&TestPoint<T, D>, &TrialPoint<T, D>) -> T,
    DefaultAllocator: Allocator<T, D>,
{
    let num_test = element.test().num_functions();
    let num_trial = element.trial().num_functions();
    assert_eq!(output.nrows(), num_test, "Output matrix must have one row per test function");
    assert_eq!(output.ncols(), num_trial, "Output matrix must have one column per trial function");
    validate_kernel_inputs(kernel, element, fields)?;

    output.fill(T::zero());
    let quadrature = element.quadrature();
    for i in 0..num_test {
        for j in 0..num_trial {
            for qp in 0..quadrature.len() {
                let point = TestPoint::new(element, fields, i, qp);
                let trial = TrialPoint::new(element, j, qp);
                output[(i, j)] += quadrature.weight(qp) * integrand(&point, &trial);
            }
        }
    }
    Ok(())
}
