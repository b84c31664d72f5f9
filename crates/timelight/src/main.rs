use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use timelight::Config;
use timelight::Engine;
use timelight::LogLevel;
use timelight::integrations::hue;
use tokio::sync::mpsc;
use tracing_subscriber::prelude::*;

/// Keep Philips Hue lights in step with the time of day.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(default_value = "timelight.toml")]
    config: PathBuf,

    /// Override the configured log level
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(config.logging.filter(args.log_level))
        .init();

    tracing::info!("timelight starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    let schedule = config.timelight.schedule()?;
    let settings = config.timelight.settings();

    let client = hue::Client::new(&config.bridge.addr, &config.bridge.app_key)
        .context("Failed to create bridge client")?;
    tracing::info!("Using bridge at {}", client.base_url());

    let mut engine = Engine::initialize(client.clone(), schedule, settings)
        .await
        .context("Failed to initialize from bridge")?;

    let (tx, rx) = mpsc::channel(hue::EVENT_CHANNEL_CAPACITY);
    let listener = hue::EventListener::new(
        client,
        hue::update_filter,
        config.bridge.retry_delay(),
    )
    .spawn(tx);

    tokio::select! {
        _ = engine.run(rx) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            tracing::info!("Shutting down");
        }
    }

    listener.abort();
    Ok(())
}
