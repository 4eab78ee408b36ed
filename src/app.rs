use crate::core::color::Colour;
use crate::core::framebuffer::{DepthBuffer, FrameBuffer};
use crate::core::geometry::{CanvasPoint, CanvasTriangle};
use crate::core::rasterizer::Rasterizer;
use crate::io::config::Config;
use crate::io::image::{save_argb_image, save_depth_image};
use crate::io::obj_loader::load_obj;
use crate::io::recording::{CameraRecorder, load_recording};
use crate::pipeline::renderer::Renderer;
use crate::scene::camera::{Camera, Pipeline, RenderMode};
use crate::scene::context::RenderContext;
use crate::scene::light::Light;
use crate::scene::mesh::smooth_vertex_normals;
use crate::scene::texture::TextureMap;
use log::{debug, info, warn};
use nalgebra::Point3;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Loads texture, models and lights described by `config`.
///
/// The main model is required. A missing texture or sphere model only
/// disables the modes that need it.
pub fn init_scene_resources(config: &Config) -> Result<RenderContext, String> {
    let texture = match &config.scene.texture {
        Some(path) => match TextureMap::load(path) {
            Ok(texture) => Some(texture),
            Err(e) => {
                warn!("{}; textured faces fall back to their colour", e);
                None
            }
        },
        None => None,
    };
    let texture_size = texture.as_ref().map(|t| (t.width, t.height));

    let triangles = load_obj(&config.scene.model, config.scene.scale, texture_size)?;

    let sphere_triangles = match &config.scene.sphere_model {
        Some(path) => match load_obj(path, config.scene.scale, None) {
            Ok(mut sphere) => {
                smooth_vertex_normals(&mut sphere);
                sphere
            }
            Err(e) => {
                warn!("{}; SPHERE_* modes will render an empty scene", e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    Ok(RenderContext {
        camera: build_camera(config),
        light: Light::new(Point3::from(config.light.position), config.light.intensity),
        triangles,
        sphere_triangles,
        texture,
    })
}

pub fn build_camera(config: &Config) -> Camera {
    let mut camera = Camera::new(
        Point3::from(config.camera.position),
        config.camera.focal_length,
    );
    camera.mode = config.render.mode;
    if let Some(target) = config.camera.look_at {
        camera.look_at(&Point3::from(target));
    }
    camera
}

pub fn build_renderer(config: &Config) -> Renderer {
    let mut renderer = Renderer::new(
        config.render.width,
        config.render.height,
        config.render.raster_scale,
    );
    let [r, g, b] = config.render.clear_colour;
    renderer.clear_colour = Colour::new(r, g, b);
    renderer
}

fn frame_path(dir: &str, prefix: &str, index: usize, extension: &str) -> PathBuf {
    Path::new(dir).join(format!("{}{:04}.{}", prefix, index, extension))
}

fn save_frame(renderer: &Renderer, path: &Path) -> Result<(), String> {
    save_argb_image(
        &renderer.framebuffer.to_argb(),
        renderer.width(),
        renderer.height(),
        path,
    )
}

/// Renders one frame of `context` to `config.render.output`. In RECORD mode
/// the camera pose is appended to the recording as well.
pub fn run_single_frame(config: &Config, context: &RenderContext) -> Result<(), String> {
    info!(
        "Rendering {} frame ({}x{})...",
        context.camera.mode, config.render.width, config.render.height
    );
    let mut renderer = build_renderer(config);
    let start_time = Instant::now();

    let stats = renderer.render_frame(context);
    info!("Render completed in {:.2?}", start_time.elapsed());
    if stats.behind_camera + stats.degenerate > 0 {
        info!(
            "Skipped {} triangles behind the camera and {} degenerate",
            stats.behind_camera, stats.degenerate
        );
    }

    save_frame(&renderer, Path::new(&config.render.output))?;

    if let Some(depth_path) = &config.render.depth_output {
        if context.camera.mode.pipeline() == Pipeline::Rasterise {
            save_depth_image(
                &renderer.depth_buffer.snapshot(),
                renderer.width(),
                renderer.height(),
                depth_path,
            )?;
        } else {
            warn!("Depth output is only written for {} frames", RenderMode::Rasterise);
        }
    }

    if context.camera.mode == RenderMode::Record {
        let mut recorder = CameraRecorder::open(&config.animation.recording)?;
        recorder.append(&context.camera.pose())?;
    }
    Ok(())
}

/// Flies the camera around the origin, one orbit step and look-at per frame.
pub fn run_orbit_animation(
    config: &Config,
    context: &mut RenderContext,
    frames: usize,
) -> Result<(), String> {
    let dir = &config.animation.output_dir;
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create output directory '{}': {}", dir, e))?;

    let mut renderer = build_renderer(config);
    let mut recorder = match context.camera.mode {
        RenderMode::Record => Some(CameraRecorder::open(&config.animation.recording)?),
        _ => None,
    };

    info!("Rendering {} orbit frames into '{}'...", frames, dir);
    let start_time = Instant::now();

    for index in 0..frames {
        context.camera.orbit(config.animation.orbit_speed);
        context.camera.look_at(&Point3::origin());

        let stats = renderer.render_frame(context);
        debug!("Frame {}: {:?}", index, stats);
        save_frame(
            &renderer,
            &frame_path(dir, "frame_", index, &config.animation.frame_extension),
        )?;

        if let Some(recorder) = recorder.as_mut() {
            recorder.append(&context.camera.pose())?;
        }
    }

    info!(
        "Animation completed in {:.2?} ({} frames)",
        start_time.elapsed(),
        frames
    );
    if let Some(recorder) = &recorder {
        info!(
            "Recorded {} camera poses to '{}'",
            recorder.count(),
            config.animation.recording
        );
    }
    Ok(())
}

/// Replays the recorded camera path in the playback mode.
pub fn run_playback(config: &Config, context: &mut RenderContext) -> Result<(), String> {
    let poses = load_recording(&config.animation.recording)?;
    if poses.is_empty() {
        return Err(format!(
            "Recording '{}' holds no camera poses",
            config.animation.recording
        ));
    }

    let dir = &config.animation.output_dir;
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create output directory '{}': {}", dir, e))?;

    context.camera.mode = config.animation.playback_mode;
    let mut renderer = build_renderer(config);
    info!(
        "Playing back {} poses in {} mode...",
        poses.len(),
        context.camera.mode
    );
    let start_time = Instant::now();

    for (index, pose) in poses.iter().enumerate() {
        context.camera.set_pose(pose);
        renderer.render_frame(context);
        save_frame(
            &renderer,
            &frame_path(dir, "b", index, &config.animation.frame_extension),
        )?;
    }

    info!("Playback completed in {:.2?}", start_time.elapsed());
    Ok(())
}

fn random_point<R: Rng>(rng: &mut R, width: usize, height: usize) -> CanvasPoint {
    CanvasPoint::with_depth(
        rng.random_range(0..width) as f32,
        rng.random_range(0..height) as f32,
        rng.random_range(-50_i32..50) as f32,
    )
}

fn random_colour<R: Rng>(rng: &mut R) -> Colour {
    Colour::new(rng.random(), rng.random(), rng.random())
}

/// Draws `count` random triangles to `config.render.output`. Even ones are
/// stroked, odd ones are filled against the depth buffer and outlined in white.
pub fn run_random_triangles(config: &Config, count: usize) -> Result<(), String> {
    let (width, height) = (config.render.width, config.render.height);
    let framebuffer = FrameBuffer::new(width, height);
    let depth = DepthBuffer::new(width, height);
    let [r, g, b] = config.render.clear_colour;
    framebuffer.clear(Colour::new(r, g, b).to_argb());

    let mut rng = rand::rng();
    let stroked = Rasterizer::new(&framebuffer);
    let filled = Rasterizer::with_depth(&framebuffer, &depth);
    let mut skipped = 0;

    for index in 0..count {
        let triangle = CanvasTriangle::new(
            random_point(&mut rng, width, height),
            random_point(&mut rng, width, height),
            random_point(&mut rng, width, height),
        );
        let colour = random_colour(&mut rng);

        if index % 2 == 0 {
            stroked.draw_stroked_triangle(&triangle, colour);
        } else if filled.draw_filled_triangle(&triangle, colour).is_ok() {
            filled.draw_stroked_triangle(&triangle, Colour::WHITE);
        } else {
            skipped += 1;
        }
    }

    if skipped > 0 {
        debug!("Skipped {} degenerate random triangles", skipped);
    }
    info!("Drew {} random triangles", count - skipped);
    save_argb_image(&framebuffer.to_argb(), width, height, &config.render.output)
}
