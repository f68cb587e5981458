//! Synthetic telemetry generator
//!
//! Emits one structurally valid sample per tick through the same registry
//! dispatch path the live connection uses, so consumers cannot tell the two
//! apart by shape. Used when the caller asks for simulation explicitly or
//! when the live connection has permanently failed.

use crate::registry::ListenerRegistry;
use crate::telemetry::TelemetrySample;
use chrono::Utc;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Valid ranges for generated readings, matching the live sensor envelope.
const ORIENTATION_RANGE: std::ops::Range<f64> = -90.0..90.0;
const ACCELERATION_RANGE: std::ops::Range<f64> = -1.0..1.0;
const ANGULAR_RATE_RANGE: std::ops::Range<f64> = -100.0..100.0;

/// Periodic synthetic sample source. Stopping and starting a new generator
/// yields a fresh, independent sequence.
pub struct SimulationGenerator {
    handle: Option<JoinHandle<()>>,
    stop_tx: watch::Sender<bool>,
}

impl SimulationGenerator {
    /// Spawn the generator task. The first sample is emitted immediately,
    /// then one per `tick`.
    pub fn start(registry: ListenerRegistry, topic: String, tick: Duration) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            info!(tick_ms = tick.as_millis() as u64, "Simulation generator started");
            let mut interval = tokio::time::interval(tick);
            // ThreadRng is not Send; seed an owned rng for this task
            let mut rng = rand::rngs::StdRng::from_entropy();
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => {
                        if *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        let sample = generate_sample(&mut rng, Utc::now().timestamp_millis() as u64);
                        debug!(timestamp = sample.timestamp, "Dispatching simulated sample");
                        registry.dispatch(&topic, &sample);
                    }
                }
            }
            info!("Simulation generator stopped");
        });

        Self {
            handle: Some(handle),
            stop_tx,
        }
    }

    /// Stop the generator. After this returns no further simulated samples
    /// are dispatched.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for SimulationGenerator {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Draw one sample with every field uniform over its valid range.
pub fn generate_sample<R: Rng>(rng: &mut R, timestamp: u64) -> TelemetrySample {
    TelemetrySample {
        yaw1: rng.gen_range(ORIENTATION_RANGE),
        pitch1: rng.gen_range(ORIENTATION_RANGE),
        roll1: rng.gen_range(ORIENTATION_RANGE),
        ax1: rng.gen_range(ACCELERATION_RANGE),
        ay1: rng.gen_range(ACCELERATION_RANGE),
        az1: rng.gen_range(ACCELERATION_RANGE),
        gx1: rng.gen_range(ANGULAR_RATE_RANGE),
        gy1: rng.gen_range(ANGULAR_RATE_RANGE),
        gz1: rng.gen_range(ANGULAR_RATE_RANGE),
        yaw2: rng.gen_range(ORIENTATION_RANGE),
        pitch2: rng.gen_range(ORIENTATION_RANGE),
        roll2: rng.gen_range(ORIENTATION_RANGE),
        ax2: rng.gen_range(ACCELERATION_RANGE),
        ay2: rng.gen_range(ACCELERATION_RANGE),
        az2: rng.gen_range(ACCELERATION_RANGE),
        gx2: rng.gen_range(ANGULAR_RATE_RANGE),
        gy2: rng.gen_range(ANGULAR_RATE_RANGE),
        gz2: rng.gen_range(ANGULAR_RATE_RANGE),
        timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_generated_fields_stay_in_range() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let sample = generate_sample(&mut rng, 1000);
            sample.validate().expect("generated sample must be finite");

            for (field, value) in sample.fields() {
                let in_range = if field.starts_with("yaw")
                    || field.starts_with("pitch")
                    || field.starts_with("roll")
                {
                    (-90.0..90.0).contains(&value)
                } else if field.starts_with('a') {
                    (-1.0..1.0).contains(&value)
                } else {
                    (-100.0..100.0).contains(&value)
                };
                assert!(in_range, "field {field} out of range: {value}");
            }
        }
    }

    #[test]
    fn test_generated_timestamp_is_the_injected_clock() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let sample = generate_sample(&mut rng, 1716465600000);
        assert_eq!(sample.timestamp, 1716465600000);
    }

    #[tokio::test]
    async fn test_generator_dispatches_through_registry() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_inner = count.clone();
        let _d = registry.register(Arc::new(move |topic, sample| {
            assert_eq!(topic, "iot/mpu6050pub");
            sample.validate().unwrap();
            count_inner.fetch_add(1, Ordering::SeqCst);
        }));

        let generator = SimulationGenerator::start(
            registry,
            "iot/mpu6050pub".to_string(),
            Duration::from_millis(20),
        );

        tokio::time::sleep(Duration::from_millis(90)).await;
        generator.stop().await;

        let emitted = count.load(Ordering::SeqCst);
        assert!(emitted >= 2, "expected at least two ticks, got {emitted}");
    }

    #[tokio::test]
    async fn test_stop_halts_dispatch() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_inner = count.clone();
        let _d = registry.register(Arc::new(move |_, _| {
            count_inner.fetch_add(1, Ordering::SeqCst);
        }));

        let generator = SimulationGenerator::start(
            registry,
            "t".to_string(),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(35)).await;
        generator.stop().await;

        let at_stop = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), at_stop);
    }

    #[tokio::test]
    async fn test_generator_is_restartable() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_inner = count.clone();
        let _d = registry.register(Arc::new(move |_, _| {
            count_inner.fetch_add(1, Ordering::SeqCst);
        }));

        let first = SimulationGenerator::start(
            registry.clone(),
            "t".to_string(),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
        first.stop().await;
        let after_first = count.load(Ordering::SeqCst);
        assert!(after_first >= 1);

        let second = SimulationGenerator::start(
            registry,
            "t".to_string(),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
        second.stop().await;
        assert!(count.load(Ordering::SeqCst) > after_first);
    }

    #[tokio::test]
    async fn test_monotonic_timestamps_across_ticks() {
        let registry = ListenerRegistry::new();
        let stamps = Arc::new(std::sync::Mutex::new(Vec::new()));
        let stamps_inner = stamps.clone();
        let _d = registry.register(Arc::new(move |_, sample: &TelemetrySample| {
            stamps_inner.lock().unwrap().push(sample.timestamp);
        }));

        let generator = SimulationGenerator::start(
            registry,
            "t".to_string(),
            Duration::from_millis(15),
        );
        tokio::time::sleep(Duration::from_millis(80)).await;
        generator.stop().await;

        let stamps = stamps.lock().unwrap();
        assert!(stamps.len() >= 2);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
