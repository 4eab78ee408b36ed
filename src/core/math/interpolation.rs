use crate::core::geometry::DegenerateGeometry;
use nalgebra::{Point3, Vector3};

const EPSILON: f32 = f32::EPSILON;

/// Calculates the barycentric coordinates (w0, w1, w2) of `p` with respect to
/// triangle `(v0, v1, v2)`, using the dot-product form of the 2x2 solve.
///
/// `p` is assumed to lie in the triangle's plane.
///
/// # Returns
/// A Vector3 where:
/// - x: weight for v0
/// - y: weight for v1
/// - z: weight for v2
pub fn barycentric(
    p: &Point3<f32>,
    [v0, v1, v2]: &[Point3<f32>; 3],
) -> Result<Vector3<f32>, DegenerateGeometry> {
    let e0 = v1 - v0;
    let e1 = v2 - v0;
    let e2 = p - v0;

    let d00 = e0.dot(&e0);
    let d01 = e0.dot(&e1);
    let d11 = e1.dot(&e1);
    let d20 = e2.dot(&e0);
    let d21 = e2.dot(&e1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < EPSILON || !denom.is_finite() {
        return Err(DegenerateGeometry::ZeroArea);
    }

    let w1 = (d11 * d20 - d01 * d21) / denom;
    let w2 = (d00 * d21 - d01 * d20) / denom;
    Ok(Vector3::new(1.0 - w1 - w2, w1, w2))
}

/// Blends three values by barycentric weights.
#[inline]
pub fn blend_scalar(weights: &Vector3<f32>, values: [f32; 3]) -> f32 {
    weights.x * values[0] + weights.y * values[1] + weights.z * values[2]
}

#[inline]
pub fn blend_vector(weights: &Vector3<f32>, values: &[Vector3<f32>; 3]) -> Vector3<f32> {
    values[0] * weights.x + values[1] * weights.y + values[2] * weights.z
}
