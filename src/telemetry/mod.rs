//! Telemetry data model, synthetic generation, and retention
//!
//! - [`sample`] - wire format of one dual-sensor reading plus validation
//! - [`simulator`] - synthetic source used for fallback and explicit simulation
//! - [`history`] - bounded window of recent samples for "last known" consumers

pub mod history;
pub mod sample;
pub mod simulator;

pub use history::History;
pub use sample::{SampleError, TelemetrySample, FIELD_COUNT};
pub use simulator::{generate_sample, SimulationGenerator};
