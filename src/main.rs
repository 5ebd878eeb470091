use anyhow::Result;

mod camera;
mod config;
mod controls;
mod engine;
mod geometry;
mod model;
mod model_loader;
mod orbit_controls;
mod rendering;
mod scene_graph;
mod scene_host;
mod stage;
mod transform_state;
mod tween;
mod views;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let config = config::AppConfig::from_env();
    log::info!("Starting with {}", config.initial_sample.label());

    pollster::block_on(window::run(config))?;

    Ok(())
}
