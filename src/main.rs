mod app;
mod collaborators;
mod config;
mod console;
mod desktop;
mod encoder;
mod error;
mod messages;
mod naming;
mod platform;
mod services;

use app::App;
use config::Config;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting timelapse recorder");

    let config = Config::load()?;
    config.validate()?;

    // LocalSet for !Send futures (the Recorder owns the capture process handle)
    let local = tokio::task::LocalSet::new();

    local
        .run_until(async move { App::new(config).await?.run().await })
        .await
}
