//! MQTT-over-WebSocket broker transport
//!
//! Split along the pure/impure seam: [`connection`], [`monitor`], and
//! [`message_handler`] hold data types and decision logic with no I/O, and
//! [`client`] owns the event loop, the signed transport, and the retry timers.

pub mod client;
pub mod connection;
pub mod message_handler;
pub mod monitor;

pub use client::ConnectionManager;
pub use connection::{ConnectionStatus, MqttError, ReconnectConfig};
