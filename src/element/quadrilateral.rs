use crate::element::{CoordinateSystem, ElementValues, QuadratureData, ReferenceElement, ShapeTable};
use crate::nalgebra::{Matrix2, Point2, Vector2, U2};
use crate::quadrature::{gauss, quadrilateral_gauss, scalar};
use crate::Real;
use eyre::eyre;
use numeric_literals::replace_float_literals;

/// Corners of the reference square, in the same order as the element vertices.
const REFERENCE_CORNERS: [[f64; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

/// A bilinear four-node quadrilateral in two dimensions.
///
/// Facet `k` is the edge from vertex `k` to vertex `k + 1 (mod 4)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad4Element<T: Real> {
    vertices: [Point2<T>; 4],
}

/// Basis data of a quadrilateral at a single reference point.
struct PointEvaluation<T: Real> {
    x: Point2<T>,
    det: T,
    values: [T; 4],
    gradients: [Vector2<T>; 4],
}

impl<T: Real> Quad4Element<T> {
    pub fn from_vertices(vertices: [Point2<T>; 4]) -> Self {
        Self { vertices }
    }

    /// The axis-aligned rectangle `[x0, x1] x [y0, y1]`.
    pub fn rectangle(x: [T; 2], y: [T; 2]) -> Self {
        Self::from_vertices([
            Point2::new(x[0], y[0]),
            Point2::new(x[1], y[0]),
            Point2::new(x[1], y[1]),
            Point2::new(x[0], y[1]),
        ])
    }

    pub fn vertices(&self) -> &[Point2<T>; 4] {
        &self.vertices
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn evaluate(&self, xi: T, eta: T) -> eyre::Result<PointEvaluation<T>> {
        let mut values = [T::zero(); 4];
        let mut reference_gradients = [Vector2::<T>::zeros(); 4];
        for (i, corner) in REFERENCE_CORNERS.iter().enumerate() {
            let xi_i = scalar::<T>(corner[0])?;
            let eta_i = scalar::<T>(corner[1])?;
            values[i] = (1.0 + xi * xi_i) * (1.0 + eta * eta_i) / 4.0;
            reference_gradients[i] = Vector2::new(xi_i * (1.0 + eta * eta_i) / 4.0, eta_i * (1.0 + xi * xi_i) / 4.0);
        }

        // Columns of J are the derivatives of x with respect to xi and eta
        let mut jacobian = Matrix2::<T>::zeros();
        let mut x = Vector2::<T>::zeros();
        for (vertex, (phi, grad)) in self
            .vertices
            .iter()
            .zip(values.iter().zip(&reference_gradients))
        {
            jacobian += vertex.coords * grad.transpose();
            x += vertex.coords * *phi;
        }

        let j_inv_t = jacobian
            .try_inverse()
            .ok_or_else(|| eyre!("Singular element Jacobian encountered"))?
            .transpose();
        let gradients = reference_gradients.map(|grad| j_inv_t * grad);

        Ok(PointEvaluation {
            x: Point2::from(x),
            det: jacobian.determinant(),
            values,
            gradients,
        })
    }

    fn collect(evaluations: &[PointEvaluation<T>]) -> ShapeTable<T, U2> {
        let n = evaluations.len();
        let mut values = Vec::with_capacity(4 * n);
        let mut gradients = Vec::with_capacity(4 * n);
        for i in 0..4 {
            for evaluation in evaluations {
                values.push(evaluation.values[i]);
                gradients.push(evaluation.gradients[i]);
            }
        }
        ShapeTable::from_values_and_gradients(4, n, values, gradients)
    }
}

impl<T: Real> ReferenceElement<T, U2> for Quad4Element<T> {
    fn num_nodes(&self) -> usize {
        4
    }

    fn num_facets(&self) -> usize {
        4
    }

    fn element_values(
        &self,
        points_per_axis: usize,
        coordinates: CoordinateSystem,
    ) -> eyre::Result<ElementValues<T, U2>> {
        let (weights, points) = quadrilateral_gauss::<T>(points_per_axis)?;
        let mut evaluations = Vec::with_capacity(points.len());
        let mut jxw = Vec::with_capacity(points.len());
        let mut coord = Vec::with_capacity(points.len());
        for (w, xi) in weights.into_iter().zip(points) {
            let evaluation = self.evaluate(xi.x, xi.y)?;
            jxw.push(w * evaluation.det.abs());
            coord.push(coordinates.factor(evaluation.x.x));
            evaluations.push(evaluation);
        }

        Ok(ElementValues::new(Self::collect(&evaluations), QuadratureData::new(jxw, coord)))
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn facet_values(
        &self,
        facet: usize,
        points_per_axis: usize,
        coordinates: CoordinateSystem,
    ) -> eyre::Result<ElementValues<T, U2>> {
        if facet >= 4 {
            return Err(eyre!("quadrilateral has no facet {}", facet));
        }
        let a = self.vertices[facet];
        let b = self.vertices[(facet + 1) % 4];
        let tangent = (b - a) / 2.0;
        let length = tangent.norm();
        if length == T::zero() {
            return Err(eyre!("degenerate quadrilateral edge {}", facet));
        }

        // Rotating the tangent clockwise points outwards for counter-clockwise vertex order
        let orientation = self.evaluate(0.0, 0.0)?.det.signum();
        let normal = Vector2::new(tangent.y, -tangent.x) * (orientation / length);

        let (weights, points) = gauss::<T>(points_per_axis)?;
        let mut evaluations = Vec::with_capacity(points.len());
        let mut jxw = Vec::with_capacity(points.len());
        let mut coord = Vec::with_capacity(points.len());
        for (w, t) in weights.into_iter().zip(points) {
            let (xi, eta) = match facet {
                0 => (t, -1.0),
                1 => (1.0, t),
                2 => (-t, 1.0),
                _ => (-1.0, -t),
            };
            let evaluation = self.evaluate(xi, eta)?;
            jxw.push(w * length);
            coord.push(coordinates.factor(evaluation.x.x));
            evaluations.push(evaluation);
        }

        let normals = vec![normal; evaluations.len()];
        let quadrature = QuadratureData::new(jxw, coord).with_normals(normals);
        Ok(ElementValues::new(Self::collect(&evaluations), quadrature))
    }
}
