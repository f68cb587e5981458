//! Transport layer for broker connectivity

pub mod mqtt;

pub use mqtt::{ConnectionManager, ConnectionStatus, MqttError, ReconnectConfig};
