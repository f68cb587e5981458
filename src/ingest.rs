//! Ingestion facade: the single entry point consumers talk to
//!
//! Owns the listener registry, the live connection manager, and the
//! simulation generator, and arbitrates which source feeds the registry.
//! Connection problems surface through [`status`](TelemetryIngest::status),
//! never as panics or errors thrown past this boundary.

use crate::config::ClientConfig;
use crate::error::sanitize_error_message;
use crate::registry::{Disposer, Listener, ListenerRegistry, RegistryStats};
use crate::telemetry::{History, SimulationGenerator, TelemetrySample};
use crate::transport::mqtt::ReconnectConfig;
use crate::transport::{ConnectionManager, ConnectionStatus};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which source currently feeds the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Broker connection over the signed WebSocket transport
    Live,
    /// Synthetic generator (requested explicitly or via fallback)
    Simulated,
}

/// Telemetry ingestion client.
///
/// One instance owns at most one data source at a time. `connect` switches
/// sources cleanly: the previous source is fully torn down before the new
/// one starts, so listeners never receive interleaved live and simulated
/// samples from a stale source.
pub struct TelemetryIngest {
    config: ClientConfig,
    registry: ListenerRegistry,
    history: History,
    _history_subscription: Disposer,
    manager: Option<ConnectionManager>,
    simulator: Option<SimulationGenerator>,
    mode: Option<IngestMode>,
    /// Cause of the live failure that triggered fallback. While set, `status`
    /// reports `Error` even though simulated samples are flowing.
    fallback_error: Option<String>,
}

impl TelemetryIngest {
    pub fn new(config: ClientConfig) -> Self {
        let registry = ListenerRegistry::new();
        let history = History::default();
        let history_subscription = history.attach(&registry);
        Self {
            config,
            registry,
            history,
            _history_subscription: history_subscription,
            manager: None,
            simulator: None,
            mode: None,
            fallback_error: None,
        }
    }

    /// Start ingesting. With `use_simulation` the synthetic generator starts
    /// immediately and the client reports `Connected`. Otherwise a live
    /// connection is attempted; if it permanently fails, the client falls
    /// back to simulation while `status` keeps reporting the live failure.
    ///
    /// Re-entrant: asking for the mode that is already active and healthy
    /// returns the current status without touching the running source. Only
    /// a genuine mode switch (or a retry after failure) tears down and
    /// rebuilds.
    ///
    /// Returns the resulting status. Never panics and never propagates an
    /// error: every failure is folded into the returned status.
    pub async fn connect(&mut self, use_simulation: bool) -> ConnectionStatus {
        if self.source_is_healthy(use_simulation) {
            debug!("connect() for the already-active mode is a no-op");
            return self.status();
        }

        self.teardown_source().await;
        self.registry.reopen();
        self.fallback_error = None;

        if use_simulation {
            info!("Starting in simulation mode");
            self.start_simulator();
            self.mode = Some(IngestMode::Simulated);
            return self.status();
        }

        let credentials = match self.config.resolve_credentials() {
            Ok(credentials) => credentials,
            Err(e) => {
                let cause = sanitize_error_message(&e.to_string());
                warn!(cause = %cause, "Credential resolution failed, falling back to simulation");
                return self.fall_back(cause);
            }
        };

        let mut manager = ConnectionManager::new(
            credentials,
            self.config.telemetry.clone(),
            ReconnectConfig::from(&self.config.reconnect),
            self.registry.clone(),
        );

        match manager.connect().await {
            Ok(()) => {
                info!("Live telemetry connection established");
                self.manager = Some(manager);
                self.mode = Some(IngestMode::Live);
                self.status()
            }
            Err(e) => {
                let cause = sanitize_error_message(&e.to_string());
                warn!(cause = %cause, "Live connection failed, falling back to simulation");
                manager.shutdown().await;
                self.fall_back(cause)
            }
        }
    }

    /// Whether the currently active source already serves the requested
    /// mode. Fallback does not count: there the caller asked for live data,
    /// so a repeat `connect(false)` is a retry, not a no-op.
    fn source_is_healthy(&self, use_simulation: bool) -> bool {
        if self.fallback_error.is_some() {
            return false;
        }
        match (use_simulation, self.mode) {
            (true, Some(IngestMode::Simulated)) => self
                .simulator
                .as_ref()
                .map(|s| s.is_running())
                .unwrap_or(false),
            (false, Some(IngestMode::Live)) => self
                .manager
                .as_ref()
                .map(|m| m.status().is_active())
                .unwrap_or(false),
            _ => false,
        }
    }

    fn fall_back(&mut self, cause: String) -> ConnectionStatus {
        self.start_simulator();
        self.mode = Some(IngestMode::Simulated);
        self.fallback_error = Some(cause);
        self.status()
    }

    fn start_simulator(&mut self) {
        self.simulator = Some(SimulationGenerator::start(
            self.registry.clone(),
            self.config.telemetry.topic.clone(),
            Duration::from_secs(self.config.simulation.tick_secs),
        ));
    }

    /// Current status. Fallback keeps reporting the live failure: a consumer
    /// must be able to tell real data from synthetic even though samples keep
    /// arriving.
    pub fn status(&self) -> ConnectionStatus {
        if let Some(cause) = &self.fallback_error {
            return ConnectionStatus::Error(cause.clone());
        }
        match self.mode {
            Some(IngestMode::Live) => self
                .manager
                .as_ref()
                .map(|m| m.status())
                .unwrap_or(ConnectionStatus::Disconnected),
            Some(IngestMode::Simulated) => ConnectionStatus::Connected,
            None => ConnectionStatus::Disconnected,
        }
    }

    /// Source currently feeding the registry, if any.
    pub fn mode(&self) -> Option<IngestMode> {
        self.mode
    }

    /// Register a listener for every accepted sample. Works before, during,
    /// and after `connect`; listeners survive source switches.
    pub fn subscribe(&self, listener: Listener) -> Disposer {
        self.registry.register(listener)
    }

    /// Most recently accepted sample, from either source.
    pub fn latest_sample(&self) -> Option<TelemetrySample> {
        self.history.latest()
    }

    /// Registry counters: listener count, listener faults, dropped payloads.
    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    /// Stop ingesting and release the active source. Idempotent. After this
    /// returns no listener is invoked again until the next `connect`.
    pub async fn shutdown(&mut self) {
        self.registry.close();
        self.teardown_source().await;
        self.mode = None;
        self.fallback_error = None;
        info!("Telemetry ingestion shut down");
    }

    async fn teardown_source(&mut self) {
        if let Some(simulator) = self.simulator.take() {
            simulator.stop().await;
        }
        if let Some(mut manager) = self.manager.take() {
            manager.shutdown().await;
        }
    }
}
