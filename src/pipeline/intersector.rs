use crate::core::geometry::ModelTriangle;
use nalgebra::{Matrix3, Point3, Vector3};

/// Closest hit along a ray.
#[derive(Debug, Clone, Copy)]
pub struct RayTriangleIntersection<'a> {
    pub point: Point3<f32>,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
    pub triangle: &'a ModelTriangle,
    pub triangle_index: usize,
    /// Edge coordinates: `point = v0 + u (v1 - v0) + v (v2 - v0)`.
    pub u: f32,
    pub v: f32,
}

/// Scene-wide ray query. Anything that can answer "what does this ray hit
/// first" can stand in for the linear sweep, e.g. a BVH.
pub trait Intersector: Sync {
    fn closest_intersection(
        &self,
        origin: &Point3<f32>,
        direction: &Vector3<f32>,
    ) -> Option<RayTriangleIntersection<'_>>;
}

/// Solves `origin + t * direction = v0 + u * e0 + v * e1` for `(t, u, v)`.
///
/// Returns `None` when the ray is parallel to the plane, the triangle is
/// degenerate, the hit is outside the triangle, or it lies behind the origin.
pub fn intersect_triangle(
    origin: &Point3<f32>,
    direction: &Vector3<f32>,
    triangle: &ModelTriangle,
) -> Option<(f32, f32, f32)> {
    let [v0, v1, v2] = *triangle.vertices();
    let e0 = v1 - v0;
    let e1 = v2 - v0;

    let system = Matrix3::from_columns(&[-direction, e0, e1]);
    let solution = system.try_inverse()? * (*origin - v0);
    let (t, u, v) = (solution.x, solution.y, solution.z);

    if !(t.is_finite() && u.is_finite() && v.is_finite()) {
        return None;
    }
    let inside = (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v) && u + v <= 1.0;
    (inside && t >= 0.0).then_some((t, u, v))
}

/// Linear sweep over every triangle.
impl Intersector for [ModelTriangle] {
    fn closest_intersection(
        &self,
        origin: &Point3<f32>,
        direction: &Vector3<f32>,
    ) -> Option<RayTriangleIntersection<'_>> {
        let mut closest: Option<RayTriangleIntersection<'_>> = None;

        for (index, triangle) in self.iter().enumerate() {
            let Some((_, u, v)) = intersect_triangle(origin, direction, triangle) else {
                continue;
            };
            let [v0, v1, v2] = *triangle.vertices();
            let point = v0 + (v1 - v0) * u + (v2 - v0) * v;
            let distance = (point - *origin).norm();

            if closest.as_ref().is_none_or(|c| distance < c.distance) {
                closest = Some(RayTriangleIntersection {
                    point,
                    distance,
                    triangle,
                    triangle_index: index,
                    u,
                    v,
                });
            }
        }
        closest
    }
}

impl Intersector for Vec<ModelTriangle> {
    fn closest_intersection(
        &self,
        origin: &Point3<f32>,
        direction: &Vector3<f32>,
    ) -> Option<RayTriangleIntersection<'_>> {
        self.as_slice().closest_intersection(origin, direction)
    }
}

/// First triangle hit by the ray from `origin` along `direction`.
#[inline]
pub fn closest_intersection<'a, I: Intersector + ?Sized>(
    scene: &'a I,
    origin: &Point3<f32>,
    direction: &Vector3<f32>,
) -> Option<RayTriangleIntersection<'a>> {
    scene.closest_intersection(origin, direction)
}
