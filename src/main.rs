//! Sensorlink command-line entry point
//!
//! Runs the ingestion client as a long-lived process, printing accepted
//! samples through the structured logger until interrupted.

use clap::{Parser, Subcommand};
use sensorlink::config::ClientConfig;
use sensorlink::error::IngestResult;
use sensorlink::ingest::TelemetryIngest;
use sensorlink::observability::init_default_logging;
use sensorlink::transport::ConnectionStatus;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Dual-IMU telemetry ingestion client
#[derive(Parser)]
#[command(name = "sensorlink")]
#[command(about = "Telemetry ingestion client for AWS IoT over MQTT/WebSocket")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and log incoming telemetry until interrupted
    Run {
        /// Use the synthetic generator instead of a live connection
        #[arg(long)]
        simulate: bool,
    },
    /// Validate configuration
    Config {
        /// Show the resolved configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting sensorlink v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run { simulate } => run_client(config, simulate).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Shutdown complete");
}

fn load_configuration(config_path: &Option<PathBuf>) -> IngestResult<ClientConfig> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(ClientConfig::load_from_file(path)?)
        }
        None => {
            // Try default locations, then the process environment
            let default_paths = ["sensorlink.toml", "config/sensorlink.toml"];
            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(ClientConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, reading from environment");
            Ok(ClientConfig::from_env()?)
        }
    }
}

async fn run_client(config: ClientConfig, simulate: bool) -> IngestResult<()> {
    let mut ingest = TelemetryIngest::new(config);

    let _subscription = ingest.subscribe(Arc::new(|topic, sample| {
        info!(
            topic,
            timestamp = sample.timestamp,
            yaw1 = sample.yaw1,
            pitch1 = sample.pitch1,
            roll1 = sample.roll1,
            yaw2 = sample.yaw2,
            pitch2 = sample.pitch2,
            roll2 = sample.roll2,
            "Telemetry sample"
        );
    }));

    let status = ingest.connect(simulate).await;
    match &status {
        ConnectionStatus::Connected => info!("Telemetry is flowing"),
        ConnectionStatus::Error(cause) => {
            error!(cause = %cause, "Live connection failed; serving simulated telemetry")
        }
        other => info!(status = ?other, "Connect returned"),
    }

    info!("Press Ctrl-C to stop");
    signal::ctrl_c().await?;
    info!("Received interrupt, shutting down gracefully...");

    let stats = ingest.stats();
    info!(
        listeners = stats.listeners,
        listener_faults = stats.listener_faults,
        dropped_payloads = stats.dropped_payloads,
        "Final registry counters"
    );

    ingest.shutdown().await;
    Ok(())
}

fn handle_config_command(config: ClientConfig, show: bool) -> IngestResult<()> {
    config.validate()?;
    info!("Configuration is valid");

    if show {
        // Secrets stay in the environment; only variable names are printed
        println!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}
