//! Telemetry sample wire format and validation
//!
//! One sample carries the full reading of both IMU sensors: orientation
//! (degrees), linear acceleration (sensor units) and angular rate
//! (degrees/second) per sensor, plus a capture timestamp in milliseconds
//! since epoch. Samples arrive as flat JSON objects on the telemetry topic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of numeric readings in one sample (two sensors, nine axes each).
pub const FIELD_COUNT: usize = 18;

/// A fixed-shape record of two sensor readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub yaw1: f64,
    pub pitch1: f64,
    pub roll1: f64,
    pub ax1: f64,
    pub ay1: f64,
    pub az1: f64,
    pub gx1: f64,
    pub gy1: f64,
    pub gz1: f64,
    pub yaw2: f64,
    pub pitch2: f64,
    pub roll2: f64,
    pub ax2: f64,
    pub ay2: f64,
    pub az2: f64,
    pub gx2: f64,
    pub gy2: f64,
    pub gz2: f64,
    /// Capture time, milliseconds since epoch
    pub timestamp: u64,
}

/// Sample decoding and validation errors
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Non-finite value in field {field}")]
    NonFinite { field: &'static str },
}

impl TelemetrySample {
    /// Decode a JSON payload and validate it. A payload missing any of the
    /// 18 numeric fields, or carrying a NaN/infinite value, is rejected.
    pub fn decode(payload: &[u8]) -> Result<Self, SampleError> {
        let sample: TelemetrySample = serde_json::from_slice(payload)?;
        sample.validate()?;
        Ok(sample)
    }

    /// Check the finiteness invariant on all numeric fields.
    pub fn validate(&self) -> Result<(), SampleError> {
        for (field, value) in self.fields() {
            if !value.is_finite() {
                return Err(SampleError::NonFinite { field });
            }
        }
        Ok(())
    }

    /// All 18 numeric readings with their wire names, in declaration order.
    pub fn fields(&self) -> [(&'static str, f64); FIELD_COUNT] {
        [
            ("yaw1", self.yaw1),
            ("pitch1", self.pitch1),
            ("roll1", self.roll1),
            ("ax1", self.ax1),
            ("ay1", self.ay1),
            ("az1", self.az1),
            ("gx1", self.gx1),
            ("gy1", self.gy1),
            ("gz1", self.gz1),
            ("yaw2", self.yaw2),
            ("pitch2", self.pitch2),
            ("roll2", self.roll2),
            ("ax2", self.ax2),
            ("ay2", self.ay2),
            ("az2", self.az2),
            ("gx2", self.gx2),
            ("gy2", self.gy2),
            ("gz2", self.gz2),
        ]
    }
}

#[cfg(test)]
pub(crate) fn zeroed_sample(timestamp: u64) -> TelemetrySample {
    TelemetrySample {
        yaw1: 0.0,
        pitch1: 0.0,
        roll1: 0.0,
        ax1: 0.0,
        ay1: 0.0,
        az1: 0.0,
        gx1: 0.0,
        gy1: 0.0,
        gz1: 0.0,
        yaw2: 0.0,
        pitch2: 0.0,
        roll2: 0.0,
        ax2: 0.0,
        ay2: 0.0,
        az2: 0.0,
        gx2: 0.0,
        gy2: 0.0,
        gz2: 0.0,
        timestamp,
    }
}
