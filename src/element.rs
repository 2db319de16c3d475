//! Basis function tables, quadrature data and reference elements.
//!
//! Kernels never evaluate basis functions themselves. Instead they consume an
//! [`ElementValues`] holding the values and physical gradients of the test and trial
//! functions at every quadrature point, together with the integration weights. The
//! reference elements in this module produce such data for simple meshes, but any
//! source of basis function data can be used.
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName, OVector, Scalar};
use crate::Real;

mod quadrilateral;
mod segment;

pub use quadrilateral::*;
pub use segment::*;

/// Values and physical gradients of a set of basis functions at quadrature points.
#[derive(Debug, Clone)]
pub struct ShapeTable<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    num_functions: usize,
    num_points: usize,
    // Indexed by `i * num_points + qp`
    values: Vec<T>,
    gradients: Vec<OVector<T, D>>,
}

impl<T, D> ShapeTable<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Constructs a table from function-major values and gradients.
    ///
    /// Entry `i * num_points + qp` holds the value (gradient) of function `i` at point `qp`.
    ///
    /// # Panics
    ///
    /// Panics if the lengths of `values` or `gradients` differ from `num_functions * num_points`.
    pub fn from_values_and_gradients(
        num_functions: usize,
        num_points: usize,
        values: Vec<T>,
        gradients: Vec<OVector<T, D>>,
    ) -> Self {
        assert_eq!(values.len(), num_functions * num_points, "Value table has wrong size");
        assert_eq!(gradients.len(), num_functions * num_points, "Gradient table has wrong size");
        Self {
            num_functions,
            num_points,
            values,
            gradients,
        }
    }

    pub fn num_functions(&self) -> usize {
        self.num_functions
    }

    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn value(&self, i: usize, qp: usize) -> T {
        self.values[i * self.num_points + qp]
    }

    pub fn gradient(&self, i: usize, qp: usize) -> &OVector<T, D> {
        &self.gradients[i * self.num_points + qp]
    }

    /// Interpolates nodal values at the given quadrature point.
    ///
    /// # Panics
    ///
    /// Panics if the number of nodal values differs from the number of functions.
    pub fn interpolate(&self, nodal_values: &[T], qp: usize) -> T {
        assert_eq!(nodal_values.len(), self.num_functions);
        nodal_values
            .iter()
            .enumerate()
            .fold(T::zero(), |acc, (i, u_i)| acc + *u_i * self.value(i, qp))
    }

    /// Interpolates the gradient of a nodal field at the given quadrature point.
    ///
    /// # Panics
    ///
    /// Panics if the number of nodal values differs from the number of functions.
    pub fn interpolate_gradient(&self, nodal_values: &[T], qp: usize) -> OVector<T, D> {
        assert_eq!(nodal_values.len(), self.num_functions);
        let mut gradient = OVector::<T, D>::zeros();
        for (i, u_i) in nodal_values.iter().enumerate() {
            gradient += self.gradient(i, qp) * *u_i;
        }
        gradient
    }
}

/// The coordinate system in which integrals are evaluated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CoordinateSystem {
    #[default]
    Cartesian,
    /// Cylindrical `(r, z)` coordinates with `r` as the first coordinate.
    Axisymmetric,
}

impl CoordinateSystem {
    /// The factor multiplying `JxW` at a point whose first coordinate is `radius`.
    pub fn factor<T: Real>(&self, radius: T) -> T {
        match self {
            Self::Cartesian => T::one(),
            Self::Axisymmetric => T::two_pi() * radius,
        }
    }
}

/// Integration weights and geometric data at the quadrature points of an element or facet.
#[derive(Debug, Clone)]
pub struct QuadratureData<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    jxw: Vec<T>,
    coord: Vec<T>,
    normals: Option<Vec<OVector<T, D>>>,
}

impl<T, D> QuadratureData<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// # Panics
    ///
    /// Panics if `jxw` and `coord` have different lengths.
    pub fn new(jxw: Vec<T>, coord: Vec<T>) -> Self {
        assert_eq!(jxw.len(), coord.len(), "Every point needs a coordinate factor");
        Self {
            jxw,
            coord,
            normals: None,
        }
    }

    /// Quadrature data in Cartesian coordinates.
    pub fn cartesian(jxw: Vec<T>) -> Self {
        let coord = vec![T::one(); jxw.len()];
        Self::new(jxw, coord)
    }

    /// Attaches outward unit normals, turning the data into facet data.
    ///
    /// # Panics
    ///
    /// Panics if the number of normals differs from the number of points.
    pub fn with_normals(self, normals: Vec<OVector<T, D>>) -> Self {
        assert_eq!(normals.len(), self.jxw.len(), "Every point needs a normal");
        Self {
            normals: Some(normals),
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.jxw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jxw.is_empty()
    }

    pub fn jxw(&self, qp: usize) -> T {
        self.jxw[qp]
    }

    pub fn coord(&self, qp: usize) -> T {
        self.coord[qp]
    }

    /// The full integration weight `JxW * coord`.
    pub fn weight(&self, qp: usize) -> T {
        self.jxw[qp] * self.coord[qp]
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn normal(&self, qp: usize) -> Option<&OVector<T, D>> {
        self.normals.as_ref().map(|normals| &normals[qp])
    }
}

/// Everything a kernel needs to know about one element or facet.
///
/// The trial space defaults to the test space. A distinct trial space can be attached
/// for mixed interpolations.
#[derive(Debug, Clone)]
pub struct ElementValues<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    test: ShapeTable<T, D>,
    trial: Option<ShapeTable<T, D>>,
    quadrature: QuadratureData<T, D>,
}

impl<T, D> ElementValues<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// # Panics
    ///
    /// Panics if the shape table and quadrature data have different numbers of points.
    pub fn new(shape: ShapeTable<T, D>, quadrature: QuadratureData<T, D>) -> Self {
        assert_eq!(shape.num_points(), quadrature.len(), "Quadrature point count mismatch");
        Self {
            test: shape,
            trial: None,
            quadrature,
        }
    }

    /// # Panics
    ///
    /// Panics if the trial table has a different number of points.
    pub fn with_trial_space(self, trial: ShapeTable<T, D>) -> Self {
        assert_eq!(trial.num_points(), self.quadrature.len(), "Quadrature point count mismatch");
        Self {
            trial: Some(trial),
            ..self
        }
    }

    pub fn test(&self) -> &ShapeTable<T, D> {
        &self.test
    }

    pub fn trial(&self) -> &ShapeTable<T, D> {
        self.trial.as_ref().unwrap_or(&self.test)
    }

    pub fn quadrature(&self) -> &QuadratureData<T, D> {
        &self.quadrature
    }

    pub fn num_points(&self) -> usize {
        self.quadrature.len()
    }

    /// Whether the test and trial spaces have the same number of functions.
    pub fn has_matching_spaces(&self) -> bool {
        self.test.num_functions() == self.trial().num_functions()
    }
}

/// A finite element that can produce [`ElementValues`] for its interior and its facets.
pub trait ReferenceElement<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn num_nodes(&self) -> usize;

    fn num_facets(&self) -> usize;

    /// Evaluates the nodal basis at a Gauss rule over the element interior.
    fn element_values(
        &self,
        points_per_axis: usize,
        coordinates: CoordinateSystem,
    ) -> eyre::Result<ElementValues<T, D>>;

    /// Evaluates the nodal basis of the element at a Gauss rule over one of its facets.
    ///
    /// The returned data carries outward unit normals.
    fn facet_values(
        &self,
        facet: usize,
        points_per_axis: usize,
        coordinates: CoordinateSystem,
    ) -> eyre::Result<ElementValues<T, D>>;
}
