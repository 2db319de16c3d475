//! Parallel accumulation of local kernel contributions into global systems.
//!
//! Elements are evaluated concurrently. Local residuals and Jacobians are computed into
//! per-thread buffers and then merged into the global vector or matrix under a lock, so that
//! every global entry receives each contribution exactly once.
use crate::element::ElementValues;
use crate::fields::FieldAccessor;
use crate::kernel::Kernel;
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DMatrixViewMut, DVector, DVectorViewMut, DefaultAllocator, DimName};
use crate::Real;
use eyre::{eyre, WrapErr};
use log::debug;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::cell::RefCell;
use thread_local::ThreadLocal;

/// Source of per-element data for global assembly.
pub trait ElementEvaluator<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn num_elements(&self) -> usize;

    /// Global degrees of freedom of the element, in the order of its basis functions.
    fn element_nodes(&self, element_index: usize) -> &[usize];

    fn element_values(&self, element_index: usize) -> &ElementValues<T, D>;

    fn element_fields(&self, element_index: usize) -> &dyn FieldAccessor<T, D>;
}

/// The data needed to evaluate kernels on one element.
pub struct ElementEvaluation<'a, T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub nodes: &'a [usize],
    pub values: &'a ElementValues<T, D>,
    pub fields: &'a (dyn FieldAccessor<T, D> + Sync),
}

impl<'a, T, D> ElementEvaluator<T, D> for [ElementEvaluation<'a, T, D>]
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn num_elements(&self) -> usize {
        self.len()
    }

    fn element_nodes(&self, element_index: usize) -> &[usize] {
        self[element_index].nodes
    }

    fn element_values(&self, element_index: usize) -> &ElementValues<T, D> {
        self[element_index].values
    }

    fn element_fields(&self, element_index: usize) -> &dyn FieldAccessor<T, D> {
        self[element_index].fields
    }
}

#[derive(Debug)]
struct AssemblerWorkspace<T> {
    element: Vec<T>,
    kernel: Vec<T>,
}

impl<T> Default for AssemblerWorkspace<T> {
    fn default() -> Self {
        Self {
            element: Vec::new(),
            kernel: Vec::new(),
        }
    }
}

/// Assembles residual vectors and Jacobian matrices of a single variable in parallel.
#[derive(Debug)]
pub struct ParallelAssembler<T: Real> {
    workspace: ThreadLocal<RefCell<AssemblerWorkspace<T>>>,
}

impl<T: Real> Default for ParallelAssembler<T> {
    fn default() -> Self {
        Self {
            workspace: ThreadLocal::new(),
        }
    }
}

/// Verifies that the element's degrees of freedom match its basis and lie in the system.
fn check_element_nodes(element_index: usize, nodes: &[usize], num_functions: usize, num_dofs: usize) -> eyre::Result<()> {
    if nodes.len() != num_functions {
        return Err(eyre!(
            "element {} has {} nodes but {} basis functions",
            element_index,
            nodes.len(),
            num_functions
        ));
    }
    if let Some(node) = nodes.iter().find(|&&node| node >= num_dofs) {
        return Err(eyre!(
            "element {} refers to node {} in a system of {} degrees of freedom",
            element_index,
            node,
            num_dofs
        ));
    }
    Ok(())
}

impl<T: Real> ParallelAssembler<T> {
    /// Sums the residuals of all kernels over all elements.
    pub fn assemble_residual<D, E>(
        &self,
        num_dofs: usize,
        kernels: &[&dyn Kernel<T, D>],
        elements: &E,
    ) -> eyre::Result<DVector<T>>
    where
        D: DimName,
        E: ?Sized + Sync + ElementEvaluator<T, D>,
        DefaultAllocator: Allocator<T, D>,
    {
        let global = Mutex::new(DVector::zeros(num_dofs));

        (0..elements.num_elements())
            .into_par_iter()
            .try_for_each(|element_index| -> eyre::Result<()> {
                let nodes = elements.element_nodes(element_index);
                let values = elements.element_values(element_index);
                let fields = elements.element_fields(element_index);
                let n = values.test().num_functions();
                check_element_nodes(element_index, nodes, n, num_dofs)?;

                let mut ws = self.workspace.get_or_default().borrow_mut();
                let AssemblerWorkspace { element, kernel } = &mut *ws;
                element.clear();
                element.resize(n, T::zero());
                kernel.resize(n, T::zero());

                for k in kernels {
                    k.compute_residual(values, fields, DVectorViewMut::from_slice(&mut kernel[..n], n))
                        .wrap_err_with(|| format!("failed to evaluate {} on element {}", k.name(), element_index))?;
                    for (e, r) in element.iter_mut().zip(&kernel[..n]) {
                        *e += *r;
                    }
                }

                let mut global = global.lock();
                for (&node, r) in nodes.iter().zip(element.iter()) {
                    global[node] += *r;
                }
                Ok(())
            })?;

        debug!(
            "Assembled residual of {} kernel(s) over {} element(s) into {} degrees of freedom",
            kernels.len(),
            elements.num_elements(),
            num_dofs
        );
        Ok(global.into_inner())
    }

    /// Sums the Jacobians of all kernels with respect to the primary variable.
    ///
    /// The test and trial functions of every element must map to the same nodes.
    pub fn assemble_jacobian<D, E>(
        &self,
        num_dofs: usize,
        kernels: &[&dyn Kernel<T, D>],
        elements: &E,
    ) -> eyre::Result<CsrMatrix<T>>
    where
        D: DimName,
        E: ?Sized + Sync + ElementEvaluator<T, D>,
        DefaultAllocator: Allocator<T, D>,
    {
        let global = Mutex::new(CooMatrix::new(num_dofs, num_dofs));

        (0..elements.num_elements())
            .into_par_iter()
            .try_for_each(|element_index| -> eyre::Result<()> {
                let nodes = elements.element_nodes(element_index);
                let values = elements.element_values(element_index);
                let fields = elements.element_fields(element_index);
                let n = values.test().num_functions();
                check_element_nodes(element_index, nodes, n, num_dofs)?;
                if !values.has_matching_spaces() {
                    return Err(eyre!(
                        "element {} has {} test but {} trial functions",
                        element_index,
                        n,
                        values.trial().num_functions()
                    ));
                }

                let mut ws = self.workspace.get_or_default().borrow_mut();
                let AssemblerWorkspace { element, kernel } = &mut *ws;
                element.clear();
                element.resize(n * n, T::zero());
                kernel.resize(n * n, T::zero());

                for k in kernels {
                    k.compute_jacobian(values, fields, DMatrixViewMut::from_slice(&mut kernel[..n * n], n, n))
                        .wrap_err_with(|| format!("failed to evaluate {} on element {}", k.name(), element_index))?;
                    for (e, a) in element.iter_mut().zip(&kernel[..n * n]) {
                        *e += *a;
                    }
                }

                let mut global = global.lock();
                // Local buffers are column-major
                for (local_col, &col) in nodes.iter().enumerate() {
                    for (local_row, &row) in nodes.iter().enumerate() {
                        global.push(row, col, element[local_col * n + local_row]);
                    }
                }
                Ok(())
            })?;

        let coo = global.into_inner();
        debug!(
            "Assembled Jacobian of {} kernel(s) over {} element(s) with {} triplets",
            kernels.len(),
            elements.num_elements(),
            coo.nnz()
        );
        Ok(CsrMatrix::from(&coo))
    }
}

/// Sums the residuals of all kernels over all elements.
///
/// Convenience wrapper around [`ParallelAssembler::assemble_residual`].
pub fn assemble_residual<T, D, E>(num_dofs: usize, kernels: &[&dyn Kernel<T, D>], elements: &E) -> eyre::Result<DVector<T>>
where
    T: Real,
    D: DimName,
    E: ?Sized + Sync + ElementEvaluator<T, D>,
    DefaultAllocator: Allocator<T, D>,
{
    ParallelAssembler::default().assemble_residual(num_dofs, kernels, elements)
}

/// Sums the Jacobians of all kernels over all elements.
///
/// Convenience wrapper around [`ParallelAssembler::assemble_jacobian`].
pub fn assemble_jacobian<T, D, E>(
    num_dofs: usize,
    kernels: &[&dyn Kernel<T, D>],
    elements: &E,
) -> eyre::Result<CsrMatrix<T>>
where
    T: Real,
    D: DimName,
    E: ?Sized + Sync + ElementEvaluator<T, D>,
    DefaultAllocator: Allocator<T, D>,
{
    ParallelAssembler::default().assemble_jacobian(num_dofs, kernels, elements)
}
