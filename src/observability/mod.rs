//! Logging setup for the ingestion client

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
