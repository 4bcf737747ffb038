//! # Sensor Hub
//!
//! Entry point of the `sensor-hub` binary. See the `hub_runtime` crate docs
//! for the startup sequence.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use hub_runtime::{
    build_registry, metrics_endpoint, mqtt, HubConfig, HubRuntime, HubStorage, StorageBackend,
};
use hub_telemetry::{log_event, TelemetryConfig};

#[derive(Debug, Parser)]
#[command(name = "sensor-hub", version, about = "MQTT ingest hub for remote sensor nodes")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "HUB_CONFIG")]
    config: Option<PathBuf>,

    /// Keep all state in memory, whatever the configured backend.
    #[arg(long)]
    memory_store: bool,
}

fn load_config(cli: &Cli) -> Result<HubConfig> {
    let mut config = match &cli.config {
        Some(path) => HubConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => HubConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid configuration override in environment")?;
    if cli.memory_store {
        config.storage.backend = StorageBackend::Memory;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::from_env();
    let _telemetry_guard =
        hub_telemetry::init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = load_config(&cli)?;
    log_event!(
        info,
        "config",
        "Configuration loaded",
        broker = %format!("{}:{}", config.broker.host, config.broker.port),
        storage = ?config.storage.backend,
        metrics = ?config.metrics.enabled.then_some(config.metrics.listen)
    );

    let storage = HubStorage::open(&config.storage, &config.type_descriptors())
        .context("Failed to open storage")?;

    let (publisher, source) = mqtt::connect(&config.broker, config.subscription_filters());
    let registry = build_registry(storage, Arc::new(publisher));

    let runtime = HubRuntime::new();

    if config.metrics.enabled {
        let listener = metrics_endpoint::bind(config.metrics.listen)
            .await
            .with_context(|| format!("Failed to bind metrics endpoint on {}", config.metrics.listen))?;
        let shutdown = runtime.shutdown_signal();
        tokio::spawn(async move {
            if let Err(e) = metrics_endpoint::serve_metrics(listener, shutdown).await {
                log_event!(error, "metrics", "Metrics endpoint failed", error = %e);
            }
        });
    }

    let shutdown = runtime.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                log_event!(info, "runtime", "Received Ctrl+C, initiating shutdown...");
                let _ = shutdown.send(true);
            }
            Err(e) => log_event!(error, "runtime", "Failed to listen for Ctrl+C", error = %e),
        }
    });

    runtime.run(source, registry).await;

    info!("Sensor hub shutdown complete");
    Ok(())
}
