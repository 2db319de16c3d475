//! Gauss quadrature rules on reference domains, converted to the scalar type of a computation.
use crate::nalgebra::Point2;
use crate::Real;
use eyre::eyre;
use fenris_quadrature::{tensor, univariate};

/// A one-dimensional rule on `[-1, 1]` given as `(weights, points)`.
pub type QuadraturePair1d<T> = (Vec<T>, Vec<T>);

/// A rule on the reference square `[-1, 1]^2` given as `(weights, points)`.
pub type QuadraturePair2d<T> = (Vec<T>, Vec<Point2<T>>);

fn check_num_points(num_points: usize) -> eyre::Result<()> {
    if num_points == 0 {
        Err(eyre!("a Gauss rule needs at least one point"))
    } else {
        Ok(())
    }
}

/// Gauss-Legendre quadrature with the given number of points on `[-1, 1]`.
///
/// The rule with `n` points integrates polynomials up to degree `2n - 1` exactly.
pub fn gauss<T: Real>(num_points: usize) -> eyre::Result<QuadraturePair1d<T>> {
    check_num_points(num_points)?;
    let (weights, points) = univariate::gauss(num_points);
    let weights = weights.into_iter().map(scalar::<T>).collect::<eyre::Result<Vec<T>>>()?;
    let points = points
        .into_iter()
        .map(|[x]| scalar::<T>(x))
        .collect::<eyre::Result<Vec<_>>>()?;
    Ok((weights, points))
}

/// Tensor product Gauss rule on the reference square `[-1, 1]^2`.
pub fn quadrilateral_gauss<T: Real>(points_per_axis: usize) -> eyre::Result<QuadraturePair2d<T>> {
    check_num_points(points_per_axis)?;
    let (weights, points) = tensor::quadrilateral_gauss(points_per_axis);
    let weights = weights.into_iter().map(scalar::<T>).collect::<eyre::Result<Vec<T>>>()?;
    let points = points
        .into_iter()
        .map(|[x, y]| Ok(Point2::new(scalar(x)?, scalar(y)?)))
        .collect::<eyre::Result<Vec<_>>>()?;
    Ok((weights, points))
}

/// Converts quadrature data to the scalar type used in a computation.
pub(crate) fn scalar<T: Real>(value: f64) -> eyre::Result<T> {
    T::from_f64(value).ok_or_else(|| eyre!("value {} is not representable in the scalar type", value))
}
