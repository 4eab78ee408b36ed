use crate::core::geometry::{CanvasPoint, CanvasTriangle, Material, ModelTriangle};
use crate::scene::camera::Camera;
use nalgebra::{Matrix3, Point3, Vector3};

/// Pinhole projection onto a `width` x `height` canvas.
///
/// `scaling_factor` converts image-plane units to pixels and is shared with
/// primary-ray generation, so a ray through a pixel hits what projects there.
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    pub width: usize,
    pub height: usize,
    pub scaling_factor: f32,
}

impl Projector {
    pub fn new(width: usize, height: usize, scaling_factor: f32) -> Self {
        Self {
            width,
            height,
            scaling_factor,
        }
    }

    #[inline(always)]
    fn half_width(&self) -> f32 {
        (self.width / 2) as f32
    }

    #[inline(always)]
    fn half_height(&self) -> f32 {
        (self.height / 2) as f32
    }

    /// Screen position truncated to whole pixels, plus depth proxy `-1/z`.
    /// Points behind the camera come out with a non-positive depth.
    pub fn project(&self, camera: &Camera, point: &Point3<f32>) -> CanvasPoint {
        let c = camera.to_camera_space(point);
        let f = camera.focal_length * self.scaling_factor;
        let x = (f * (-c.x / c.z) + self.half_width()).trunc();
        let y = (f * (c.y / c.z) + self.half_height()).trunc();
        CanvasPoint::with_depth(x, y, -1.0 / c.z)
    }

    /// Projects all three vertices; textured triangles carry their texture
    /// coordinates through to the canvas.
    pub fn project_triangle(&self, camera: &Camera, triangle: &ModelTriangle) -> CanvasTriangle {
        let [a, b, c] = triangle.vertices();
        let mut projected = CanvasTriangle::new(
            self.project(camera, a),
            self.project(camera, b),
            self.project(camera, c),
        );
        if let Material::Textured(points) = &triangle.material {
            for (vertex, tp) in projected.vertices.iter_mut().zip(points) {
                vertex.texture = Some(tp.coords());
            }
        }
        projected
    }

    /// World-space unit direction of the primary ray through the centre of
    /// pixel `(x, y)`. `inverse` is `camera.inverse_orientation()`, hoisted
    /// out of the pixel loop by the caller.
    pub fn ray_direction(
        &self,
        camera: &Camera,
        inverse: &Matrix3<f32>,
        x: usize,
        y: usize,
    ) -> Vector3<f32> {
        let sx = x as f32 + 0.5;
        let sy = y as f32 + 0.5;
        let local = Vector3::new(
            sx - self.half_width(),
            self.half_height() - sy,
            -camera.focal_length * self.scaling_factor,
        );
        (inverse * local).normalize()
    }
}
