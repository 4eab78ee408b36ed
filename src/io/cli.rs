use crate::io::config::Config;
use crate::scene::camera::RenderMode;
use clap::Parser;
use log::info;

/// What the binary should do after parsing its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SingleFrame,
    /// Orbit the camera around the origin for this many frames.
    Orbit(usize),
    Playback,
    /// Draw this many random stroked and filled triangles.
    RandomTriangles(usize),
    DumpConfig,
}

#[derive(Parser, Debug)]
#[command(name = "cornell-renderer")]
#[command(about = "TOML-driven software renderer: wireframe, rasterised and ray-traced frames")]
pub struct Cli {
    /// Config file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<String>,

    /// Render mode tag, e.g. RASTERISE, RAYTRACE_D, SPHERE_P
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<RenderMode>,

    /// Output image path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Render an orbit animation with the configured frame count
    #[arg(long)]
    pub orbit: bool,

    /// Orbit frame count; implies --orbit
    #[arg(long)]
    pub frames: Option<usize>,

    /// Replay the recorded camera path to numbered frames
    #[arg(long)]
    pub playback: bool,

    /// Draw this many random triangles instead of the scene
    #[arg(long, value_name = "COUNT")]
    pub random_triangles: Option<usize>,

    /// Also write a greyscale depth map of rasterised frames
    #[arg(long, value_name = "FILE")]
    pub depth_output: Option<String>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    pub dump_config: bool,
}

fn parse_mode(s: &str) -> Result<RenderMode, String> {
    s.parse()
}

impl Cli {
    /// Loads the config file, or the defaults, and applies flag overrides.
    pub fn load_config(&self) -> Result<Config, String> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading config file: {}", path);
                Config::load(path)?
            }
            None => {
                info!("Using default settings");
                Config::default()
            }
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(mode) = self.mode {
            config.render.mode = mode;
        }
        if let Some(output) = &self.output {
            config.render.output = output.clone();
        }
        if let Some(depth) = &self.depth_output {
            config.render.depth_output = Some(depth.clone());
        }
        if let Some(frames) = self.frames {
            config.animation.frames = frames;
        }
    }

    /// Picks the action. Orbit length comes from `config`, so overrides must
    /// already be applied.
    pub fn command(&self, config: &Config) -> Command {
        if self.dump_config {
            Command::DumpConfig
        } else if self.playback {
            Command::Playback
        } else if let Some(count) = self.random_triangles {
            Command::RandomTriangles(count)
        } else if self.orbit || self.frames.is_some() {
            Command::Orbit(config.animation.frames)
        } else {
            Command::SingleFrame
        }
    }
}
