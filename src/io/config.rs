use crate::scene::camera::RenderMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    // --- Output ---
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_output")]
    pub output: String,
    /// Greyscale depth map written next to rasterised frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_output: Option<String>,

    // --- Pipeline ---
    #[serde(default)]
    pub mode: RenderMode,
    /// Image-plane units to pixels, shared by projection and primary rays.
    #[serde(default = "default_raster_scale")]
    pub raster_scale: f32,
    #[serde(default = "default_clear_colour")]
    pub clear_colour: [u8; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            output: default_output(),
            depth_output: None,
            mode: RenderMode::default(),
            raster_scale: default_raster_scale(),
            clear_colour: default_clear_colour(),
        }
    }
}

fn default_width() -> usize {
    500
}
fn default_height() -> usize {
    400
}
fn default_output() -> String {
    "output.png".to_string()
}
fn default_raster_scale() -> f32 {
    160.0
}
fn default_clear_colour() -> [u8; 3] {
    [0, 0, 0]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default = "default_focal_length")]
    pub focal_length: f32,
    /// When set, the camera is turned to face this point before rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub look_at: Option<[f32; 3]>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: default_camera_position(),
            focal_length: default_focal_length(),
            look_at: None,
        }
    }
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, 4.0]
}
fn default_focal_length() -> f32 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightConfig {
    #[serde(default = "default_light_position")]
    pub position: [f32; 3],
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            position: default_light_position(),
            intensity: default_intensity(),
        }
    }
}

fn default_light_position() -> [f32; 3] {
    [0.0, 0.8, 0.0]
}
fn default_intensity() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Smooth-shaded model for the SPHERE_* modes.
    #[serde(default = "default_sphere_model", skip_serializing_if = "Option::is_none")]
    pub sphere_model: Option<String>,
    #[serde(default = "default_texture", skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default = "default_model_scale")]
    pub scale: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            sphere_model: default_sphere_model(),
            texture: default_texture(),
            scale: default_model_scale(),
        }
    }
}

fn default_model() -> String {
    "assets/cornell-box.obj".to_string()
}
fn default_sphere_model() -> Option<String> {
    Some("assets/sphere.obj".to_string())
}
fn default_texture() -> Option<String> {
    Some("assets/texture.ppm".to_string())
}
fn default_model_scale() -> f32 {
    0.35
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "default_frames")]
    pub frames: usize,
    /// Radians per frame around the world Y axis.
    #[serde(default = "default_orbit_speed")]
    pub orbit_speed: f32,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_recording")]
    pub recording: String,
    #[serde(default = "default_playback_mode")]
    pub playback_mode: RenderMode,
    #[serde(default = "default_frame_extension")]
    pub frame_extension: String,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frames: default_frames(),
            orbit_speed: default_orbit_speed(),
            output_dir: default_output_dir(),
            recording: default_recording(),
            playback_mode: default_playback_mode(),
            frame_extension: default_frame_extension(),
        }
    }
}

fn default_frames() -> usize {
    60
}
fn default_orbit_speed() -> f32 {
    0.05
}
fn default_output_dir() -> String {
    "frames".to_string()
}
fn default_recording() -> String {
    "camera.rec".to_string()
}
fn default_playback_mode() -> RenderMode {
    RenderMode::SpherePhong
}
fn default_frame_extension() -> String {
    "png".to_string()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content =
            fs::read_to_string(path).map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!((config.render.width, config.render.height), (500, 400));
        assert_eq!(config.render.mode, RenderMode::Rasterise);
        assert_eq!(config.render.raster_scale, 160.0);
        assert_eq!(config.camera.position, [0.0, 0.0, 4.0]);
        assert_eq!(config.light.position, [0.0, 0.8, 0.0]);
        assert_eq!(config.scene.scale, 0.35);
        assert_eq!(config.animation.playback_mode, RenderMode::SpherePhong);
    }

    #[test]
    fn overrides_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [render]
            mode = "RAYTRACE_R"
            width = 320

            [light]
            intensity = 2.5

            [scene]
            texture = "bricks.ppm"
            "#,
        )
        .unwrap();
        assert_eq!(config.render.mode, RenderMode::RaytraceReflection);
        assert_eq!(config.render.width, 320);
        assert_eq!(config.render.height, 400);
        assert_eq!(config.light.intensity, 2.5);
        assert_eq!(config.light.position, [0.0, 0.8, 0.0]);
        assert_eq!(config.scene.texture.as_deref(), Some("bricks.ppm"));
        assert_eq!(config.scene.model, "assets/cornell-box.obj");
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let err = Config::parse("[render]\nmode = \"SPHERE_X\"").unwrap_err();
        assert!(err.starts_with("Failed to parse TOML"));
    }

    #[test]
    fn mode_tags_ignore_case() {
        let config = Config::parse("[render]\nmode = \"raytrace_tm\"").unwrap();
        assert_eq!(config.render.mode, RenderMode::RaytraceTexture);
        let config = Config::parse("[animation]\nplayback_mode = \"Sphere_G\"").unwrap();
        assert_eq!(config.animation.playback_mode, RenderMode::SphereGouraud);
    }

    #[test]
    fn dumped_config_reloads() {
        let mut config = Config::default();
        config.render.mode = RenderMode::SphereGouraud;
        config.camera.look_at = Some([0.0, 0.5, 0.0]);
        let text = config.to_toml().unwrap();
        let reloaded = Config::parse(&text).unwrap();
        assert_eq!(reloaded.render.mode, RenderMode::SphereGouraud);
        assert_eq!(reloaded.camera.look_at, Some([0.0, 0.5, 0.0]));
        assert_eq!(reloaded.animation.recording, config.animation.recording);
    }
}
