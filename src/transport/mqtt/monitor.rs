//! Pure reconnection and state-transition logic
//!
//! Decision making for the connection supervisor lives here so it can be
//! tested without a broker or a running event loop.

use super::connection::{ConnectionStatus, ReconnectConfig};
use std::time::Duration;
use tracing::{error, info, warn};

/// Events observed by the supervisor that drive status transitions.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Broker acknowledged the handshake
    ConnAckReceived,
    /// Broker closed the connection
    ClosedByBroker,
    /// Network or protocol failure
    NetworkError(String),
    /// Retry scheduled (attempt count)
    RetryScheduled(u32),
    /// Failure threshold crossed; no more retries
    PermanentFailure(String),
    /// Explicit shutdown requested by the owner
    ShutdownRequested,
}

/// Decision for a failed or closed connection.
#[derive(Debug, PartialEq)]
pub enum RetryDecision {
    /// Retry after the given delay
    Proceed { attempt: u32, delay_ms: u64 },
    /// Stop: shutdown was requested
    AbortShutdownRequested,
    /// Stop: consecutive failures reached the configured threshold
    AbortThresholdReached,
}

/// Decide whether the supervisor should schedule another attempt.
pub fn next_retry(
    consecutive_failures: u32,
    config: &ReconnectConfig,
    shutdown_requested: bool,
) -> RetryDecision {
    if shutdown_requested {
        return RetryDecision::AbortShutdownRequested;
    }

    if let Some(max) = config.max_attempts {
        if consecutive_failures >= max {
            return RetryDecision::AbortThresholdReached;
        }
    }

    let attempt = consecutive_failures + 1;
    RetryDecision::Proceed {
        attempt,
        delay_ms: config.backoff_delay(attempt),
    }
}

/// Status following an observed event.
pub fn next_status(event: ConnectionEvent) -> ConnectionStatus {
    match event {
        ConnectionEvent::ConnAckReceived => {
            info!("Broker connection established");
            ConnectionStatus::Connected
        }
        ConnectionEvent::ClosedByBroker => {
            warn!("Broker closed the connection");
            ConnectionStatus::Reconnecting(0)
        }
        ConnectionEvent::NetworkError(cause) => {
            warn!(cause = %cause, "Transport error");
            ConnectionStatus::Reconnecting(0)
        }
        ConnectionEvent::RetryScheduled(attempt) => {
            info!(attempt, "Scheduling reconnection attempt");
            ConnectionStatus::Reconnecting(attempt)
        }
        ConnectionEvent::PermanentFailure(cause) => {
            error!(cause = %cause, "Connection permanently failed");
            ConnectionStatus::Error(cause)
        }
        ConnectionEvent::ShutdownRequested => ConnectionStatus::Disconnected,
    }
}

/// Overall timeout for the initial `connect()` await: every bounded attempt
/// gets the per-attempt handshake timeout plus its backoff sleep. Unlimited
/// retries fall back to a single handshake timeout.
pub fn connect_timeout(config: &ReconnectConfig, handshake_timeout: Duration) -> Duration {
    match (config.max_attempts, config.max_total_backoff()) {
        (Some(attempts), Some(backoff_ms)) => {
            handshake_timeout * (attempts + 1) + Duration::from_millis(backoff_ms)
        }
        _ => handshake_timeout,
    }
}
