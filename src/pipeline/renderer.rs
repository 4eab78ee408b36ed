use crate::core::color::Colour;
use crate::core::framebuffer::{DepthBuffer, FrameBuffer};
use crate::pipeline::passes::{self, FrameStats};
use crate::pipeline::projector::Projector;
use crate::scene::camera::Pipeline;
use crate::scene::context::RenderContext;
use log::debug;

/// Owns the frame and depth buffers and dispatches each frame to the
/// pipeline selected by the camera mode.
pub struct Renderer {
    pub framebuffer: FrameBuffer,
    pub depth_buffer: DepthBuffer,
    pub projector: Projector,
    pub clear_colour: Colour,
}

impl Renderer {
    /// `scaling_factor` is shared by projection and primary rays.
    pub fn new(width: usize, height: usize, scaling_factor: f32) -> Self {
        Self {
            framebuffer: FrameBuffer::new(width, height),
            depth_buffer: DepthBuffer::new(width, height),
            projector: Projector::new(width, height, scaling_factor),
            clear_colour: Colour::BLACK,
        }
    }

    pub fn width(&self) -> usize {
        self.framebuffer.width
    }

    pub fn height(&self) -> usize {
        self.framebuffer.height
    }

    /// Clears the frame and draws `context` with its camera's mode.
    pub fn render_frame(&mut self, context: &RenderContext) -> FrameStats {
        self.framebuffer.clear(self.clear_colour.to_argb());

        let camera = &context.camera;
        let triangles = context.active_triangles();
        let texture = context.texture.as_ref();

        let stats = match camera.mode.pipeline() {
            Pipeline::Wireframe => {
                passes::draw_wireframe(camera, triangles, &self.projector, &self.framebuffer)
            }
            Pipeline::Rasterise => passes::rasterize(
                camera,
                triangles,
                &self.projector,
                texture,
                &self.depth_buffer,
                &self.framebuffer,
            ),
            Pipeline::Raytrace(model) => passes::trace_scene(
                camera,
                &context.light,
                triangles,
                texture,
                &self.projector,
                model,
                &self.framebuffer,
            ),
        };

        debug!(
            "{} frame: {} drawn, {} behind camera, {} degenerate, {} missed rays",
            camera.mode, stats.drawn, stats.behind_camera, stats.degenerate, stats.missed_rays
        );
        stats
    }
}
