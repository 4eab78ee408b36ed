use clap::Parser;
use cornell_renderer::app::{
    init_scene_resources, run_orbit_animation, run_playback, run_random_triangles,
    run_single_frame,
};
use cornell_renderer::io::cli::{Cli, Command};
use log::info;

fn main() -> Result<(), String> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp(None)
        .format_level(true)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    match cli.command(&config) {
        Command::DumpConfig => {
            println!("{}", config.to_toml()?);
            Ok(())
        }
        Command::RandomTriangles(count) => run_random_triangles(&config, count),
        Command::SingleFrame => {
            let context = init_scene_resources(&config)?;
            run_single_frame(&config, &context)
        }
        Command::Orbit(frames) => {
            let mut context = init_scene_resources(&config)?;
            run_orbit_animation(&config, &mut context, frames)
        }
        Command::Playback => {
            let mut context = init_scene_resources(&config)?;
            run_playback(&config, &mut context)
        }
    }?;

    info!("Done.");
    Ok(())
}
