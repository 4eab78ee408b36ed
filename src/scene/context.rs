use crate::core::geometry::ModelTriangle;
use crate::scene::camera::{Camera, SceneSelection};
use crate::scene::light::Light;
use crate::scene::texture::TextureMap;

/// Everything one frame reads. Mutated only between frames.
pub struct RenderContext {
    pub camera: Camera,
    pub light: Light,
    pub triangles: Vec<ModelTriangle>,
    /// Smooth-shaded scene used by the SPHERE_* modes.
    pub sphere_triangles: Vec<ModelTriangle>,
    pub texture: Option<TextureMap>,
}

impl RenderContext {
    /// Triangles for the camera's current mode.
    pub fn active_triangles(&self) -> &[ModelTriangle] {
        match self.camera.mode.scene() {
            SceneSelection::Main => &self.triangles,
            SceneSelection::Sphere => &self.sphere_triangles,
        }
    }
}
