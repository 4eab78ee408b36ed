use crate::core::geometry::ModelTriangle;
use log::debug;
use nalgebra::{Point3, Vector3};

/// Averages the face normals of every triangle that has a vertex exactly at
/// `vertex`. Degenerate faces are ignored. Returns zero if nothing touches it.
pub fn vertex_normal(vertex: &Point3<f32>, triangles: &[ModelTriangle]) -> Vector3<f32> {
    let (sum, count) = triangles
        .iter()
        .filter(|t| !t.is_degenerate() && t.vertices().contains(vertex))
        .fold((Vector3::zeros(), 0usize), |(sum, count), t| {
            (sum + t.normal(), count + 1)
        });

    if count == 0 {
        Vector3::zeros()
    } else {
        sum / count as f32
    }
}

/// Fills `vertex_normals` on every triangle from its neighbours' face normals.
///
/// This is a quadratic scan; it is meant for the small meshes the ray tracer
/// handles. Vertices with no usable neighbour keep the face normal.
pub fn smooth_vertex_normals(triangles: &mut [ModelTriangle]) {
    let smoothed: Vec<[Vector3<f32>; 3]> = triangles
        .iter()
        .map(|t| {
            t.vertices().map(|v| {
                vertex_normal(&v, triangles)
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(|| t.normal())
            })
        })
        .collect();

    for (triangle, normals) in triangles.iter_mut().zip(smoothed) {
        triangle.vertex_normals = normals;
    }
    debug!("Smoothed vertex normals for {} triangles", triangles.len());
}
