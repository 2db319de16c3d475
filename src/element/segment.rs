use crate::element::{CoordinateSystem, ElementValues, QuadratureData, ReferenceElement, ShapeTable};
use crate::nalgebra::{Vector1, U1};
use crate::quadrature::gauss;
use crate::Real;
use eyre::eyre;
use numeric_literals::replace_float_literals;

/// A linear two-node segment on the real line.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Segment2Element<T> {
    vertices: [T; 2],
}

impl<T: Real> Segment2Element<T> {
    pub fn from_interval(interval: [T; 2]) -> Self {
        Self { vertices: interval }
    }

    pub fn vertices(&self) -> &[T; 2] {
        &self.vertices
    }

    /// Half the signed length, i.e. the Jacobian of the map from `[-1, 1]`.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference_jacobian(&self) -> T {
        (self.vertices[1] - self.vertices[0]) / 2.0
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn basis(xi: T) -> [T; 2] {
        [(1.0 - xi) / 2.0, (1.0 + xi) / 2.0]
    }

    fn map_reference_coords(&self, xi: T) -> T {
        let [phi_0, phi_1] = Self::basis(xi);
        self.vertices[0] * phi_0 + self.vertices[1] * phi_1
    }

    /// Basis values and physical gradients at the given reference points.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn shape_table(&self, reference_points: &[T]) -> eyre::Result<ShapeTable<T, U1>> {
        let j = self.reference_jacobian();
        if j == T::zero() {
            return Err(eyre!("Singular element Jacobian encountered"));
        }
        let gradients_ref = [-0.5, 0.5];

        let n = reference_points.len();
        let mut values = Vec::with_capacity(2 * n);
        let mut gradients = Vec::with_capacity(2 * n);
        for i in 0..2 {
            for xi in reference_points {
                values.push(Self::basis(*xi)[i]);
                gradients.push(Vector1::new(gradients_ref[i] / j));
            }
        }
        Ok(ShapeTable::from_values_and_gradients(2, n, values, gradients))
    }
}

impl<T: Real> ReferenceElement<T, U1> for Segment2Element<T> {
    fn num_nodes(&self) -> usize {
        2
    }

    fn num_facets(&self) -> usize {
        2
    }

    fn element_values(
        &self,
        points_per_axis: usize,
        coordinates: CoordinateSystem,
    ) -> eyre::Result<ElementValues<T, U1>> {
        let (weights, points) = gauss::<T>(points_per_axis)?;
        let shape = self.shape_table(&points)?;

        let det = self.reference_jacobian().abs();
        let mut jxw = Vec::with_capacity(points.len());
        let mut coord = Vec::with_capacity(points.len());
        for (w, xi) in weights.into_iter().zip(&points) {
            jxw.push(w * det);
            coord.push(coordinates.factor(self.map_reference_coords(*xi)));
        }

        Ok(ElementValues::new(shape, QuadratureData::new(jxw, coord)))
    }

    /// The facets of a segment are its end points, so `points_per_axis` is ignored.
    ///
    /// Facet `0` is the first vertex and facet `1` the second.
    fn facet_values(
        &self,
        facet: usize,
        _points_per_axis: usize,
        coordinates: CoordinateSystem,
    ) -> eyre::Result<ElementValues<T, U1>> {
        let xi = match facet {
            0 => -T::one(),
            1 => T::one(),
            _ => return Err(eyre!("segment has no facet {}", facet)),
        };
        let shape = self.shape_table(&[xi])?;

        // The outward direction at an end point is away from the other end point
        let direction = self.reference_jacobian().signum() * xi;
        let x = self.map_reference_coords(xi);
        let quadrature =
            QuadratureData::new(vec![T::one()], vec![coordinates.factor(x)]).with_normals(vec![Vector1::new(direction)]);

        Ok(ElementValues::new(shape, quadrature))
    }
}
