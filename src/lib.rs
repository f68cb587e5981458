//! Sensorlink - dual-IMU telemetry ingestion client
//!
//! Connects to an AWS IoT broker over MQTT-on-WebSocket using SigV4-signed
//! URLs, fans incoming telemetry out to registered listeners, and falls back
//! to a synthetic generator when the live connection cannot be established.
//!
//! # Overview
//!
//! - [`signer`] - SigV4 presigning of the WebSocket connection URL
//! - [`config`] - TOML configuration with environment-variable secrets
//! - [`registry`] - thread-safe listener fan-out
//! - [`telemetry`] - sample model, validation, simulation, history
//! - [`transport`] - connection manager with bounded reconnection
//! - [`ingest`] - the facade consumers talk to
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sensorlink::config::ClientConfig;
//! use sensorlink::ingest::TelemetryIngest;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let mut ingest = TelemetryIngest::new(config);
//!
//! let subscription = ingest.subscribe(Arc::new(|topic, sample| {
//!     println!("{topic}: yaw1={:.1} at {}", sample.yaw1, sample.timestamp);
//! }));
//!
//! let status = ingest.connect(false).await;
//! println!("status: {status:?}");
//!
//! // ... later
//! subscription.dispose();
//! ingest.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod observability;
pub mod registry;
pub mod signer;
pub mod telemetry;
pub mod transport;

pub use config::{ClientConfig, Credentials};
pub use error::{IngestError, IngestResult};
pub use ingest::{IngestMode, TelemetryIngest};
pub use registry::{Disposer, Listener, ListenerRegistry, RegistryStats};
pub use telemetry::TelemetrySample;
pub use transport::ConnectionStatus;
