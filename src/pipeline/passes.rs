use crate::core::color::Colour;
use crate::core::framebuffer::{DepthBuffer, PixelSink};
use crate::core::geometry::{CanvasTriangle, Material, ModelTriangle};
use crate::core::rasterizer::Rasterizer;
use crate::pipeline::intersector::Intersector;
use crate::pipeline::projector::Projector;
use crate::pipeline::shading::{ShadingEngine, ShadingModel};
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::texture::TextureMap;
use log::debug;
use rayon::prelude::*;
use std::ops::Add;

/// What happened to the primitives of one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub drawn: usize,
    /// Triangles with a vertex at or behind the camera plane.
    pub behind_camera: usize,
    /// Triangles rejected as `DegenerateGeometry`.
    pub degenerate: usize,
    /// Primary rays that hit nothing.
    pub missed_rays: usize,
}

impl FrameStats {
    fn drawn() -> Self {
        Self {
            drawn: 1,
            ..Self::default()
        }
    }

    fn behind() -> Self {
        Self {
            behind_camera: 1,
            ..Self::default()
        }
    }

    fn degenerate() -> Self {
        Self {
            degenerate: 1,
            ..Self::default()
        }
    }
}

impl Add for FrameStats {
    type Output = FrameStats;

    fn add(self, rhs: FrameStats) -> FrameStats {
        FrameStats {
            drawn: self.drawn + rhs.drawn,
            behind_camera: self.behind_camera + rhs.behind_camera,
            degenerate: self.degenerate + rhs.degenerate,
            missed_rays: self.missed_rays + rhs.missed_rays,
        }
    }
}

/// Projected triangle lies entirely in front of the camera.
fn in_front(triangle: &CanvasTriangle) -> bool {
    triangle
        .vertices
        .iter()
        .all(|v| v.is_finite() && v.depth > 0.0)
}

/// Stroked outlines, no depth test.
pub fn draw_wireframe<S: PixelSink + ?Sized>(
    camera: &Camera,
    triangles: &[ModelTriangle],
    projector: &Projector,
    sink: &S,
) -> FrameStats {
    let raster = Rasterizer::new(sink);
    let mut stats = FrameStats::default();

    for triangle in triangles {
        let canvas = projector.project_triangle(camera, triangle);
        if !in_front(&canvas) {
            stats = stats + FrameStats::behind();
            continue;
        }
        raster.draw_stroked_triangle(&canvas, triangle.colour);
        stats = stats + FrameStats::drawn();
    }
    stats
}

/// Depth-tested filled triangles, drawn in parallel. Clears `depth` first.
/// Textured triangles use the texture when one is supplied.
pub fn rasterize<S: PixelSink + ?Sized>(
    camera: &Camera,
    triangles: &[ModelTriangle],
    projector: &Projector,
    texture: Option<&TextureMap>,
    depth: &DepthBuffer,
    sink: &S,
) -> FrameStats {
    depth.clear();
    let raster = Rasterizer::with_depth(sink, depth);

    triangles
        .par_iter()
        .map(|triangle| {
            let canvas = projector.project_triangle(camera, triangle);
            if !in_front(&canvas) {
                return FrameStats::behind();
            }
            let result = match (&triangle.material, texture) {
                (Material::Textured(_), Some(texture)) => {
                    raster.draw_textured_triangle(&canvas, texture)
                }
                _ => raster.draw_filled_triangle(&canvas, triangle.colour),
            };
            match result {
                Ok(()) => FrameStats::drawn(),
                Err(e) => {
                    debug!("Skipped triangle: {}", e);
                    FrameStats::degenerate()
                }
            }
        })
        .reduce(FrameStats::default, |a, b| a + b)
}

/// Casts one primary ray per pixel, rows in parallel. Misses are black.
pub fn trace_scene<I, S>(
    camera: &Camera,
    light: &Light,
    scene: &I,
    texture: Option<&TextureMap>,
    projector: &Projector,
    model: ShadingModel,
    sink: &S,
) -> FrameStats
where
    I: Intersector + ?Sized,
    S: PixelSink + ?Sized,
{
    let inverse = camera.inverse_orientation();
    let engine = ShadingEngine::new(scene, light, texture);

    let missed: usize = (0..projector.height)
        .into_par_iter()
        .map(|y| {
            let mut missed = 0;
            for x in 0..projector.width {
                let direction = projector.ray_direction(camera, &inverse, x, y);
                let colour = match scene.closest_intersection(&camera.position, &direction) {
                    Some(hit) => engine.shade(&hit, &camera.position, model),
                    None => {
                        missed += 1;
                        Colour::BLACK
                    }
                };
                sink.set_pixel(x, y, colour.to_argb());
            }
            missed
        })
        .sum();

    FrameStats {
        drawn: projector.width * projector.height - missed,
        missed_rays: missed,
        ..FrameStats::default()
    }
}
