mod app;
mod cli;
mod input;

use anyhow::{Context, Result};
use clap::Parser;
use ssdo_wgpu::RenderSettings;
use winit::event_loop::{ControlFlow, EventLoop};

use app::App;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = cli::Cli::parse();

    let mut app = App::new(cli, RenderSettings::default());
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run_app(&mut app).context("event loop failed")?;

    match app.take_error() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
