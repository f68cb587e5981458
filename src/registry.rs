//! Thread-safe broadcast registry for telemetry listeners
//!
//! Live and simulated sources both feed the same registry, so consumers see
//! one dispatch path regardless of mode. Dispatch takes a snapshot of the
//! listener set under the lock and invokes listeners outside of it, so
//! subscribe/dispose can run concurrently with delivery and a dispatch never
//! observes a partially mutated set.

use crate::telemetry::TelemetrySample;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Callback invoked with (topic, sample) for every accepted message.
pub type Listener = Arc<dyn Fn(&str, &TelemetrySample) + Send + Sync>;

struct Entry {
    id: u64,
    listener: Listener,
}

struct Shared {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
    closed: AtomicBool,
    /// Listener callbacks that panicked during dispatch
    faults: AtomicU64,
    /// Payloads rejected before dispatch (malformed, non-finite, stale)
    dropped: AtomicU64,
}

/// Broadcast fan-out of telemetry samples to registered listeners.
///
/// Cheap to clone; all clones share the same listener set.
#[derive(Clone)]
pub struct ListenerRegistry {
    shared: Arc<Shared>,
}

/// Registry counters exposed for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub listeners: usize,
    pub listener_faults: u64,
    pub dropped_payloads: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
                closed: AtomicBool::new(false),
                faults: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Register a listener. The returned disposer is idempotent; dropping it
    /// without calling `dispose` leaves the listener registered.
    pub fn register(&self, listener: Listener) -> Disposer {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.shared.entries.lock().expect("registry lock poisoned");
        entries.push(Entry { id, listener });
        Disposer {
            shared: self.shared.clone(),
            id,
            disposed: AtomicBool::new(false),
        }
    }

    /// Deliver one sample to every currently registered listener, in
    /// registration order. A panicking listener is isolated and counted; it
    /// never prevents delivery to later listeners and never reaches the
    /// transport.
    pub fn dispatch(&self, topic: &str, sample: &TelemetrySample) {
        if self.shared.closed.load(Ordering::SeqCst) {
            return;
        }

        // Snapshot under the lock, invoke outside it
        let snapshot: Vec<Listener> = {
            let entries = self.shared.entries.lock().expect("registry lock poisoned");
            entries.iter().map(|e| e.listener.clone()).collect()
        };

        for listener in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| listener(topic, sample)));
            if result.is_err() {
                self.shared.faults.fetch_add(1, Ordering::Relaxed);
                warn!(topic, "Telemetry listener panicked during dispatch");
            }
        }
    }

    /// Record a payload rejected before dispatch.
    pub fn record_dropped(&self) {
        self.shared.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Stop all future dispatches. Effective immediately for dispatches that
    /// have not started; a dispatch already iterating its snapshot completes.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
    }

    /// Re-enable dispatch after a `close`, for a fresh connect cycle.
    pub fn reopen(&self) {
        self.shared.closed.store(false, Ordering::SeqCst);
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            listeners: self
                .shared
                .entries
                .lock()
                .expect("registry lock poisoned")
                .len(),
            listener_faults: self.shared.faults.load(Ordering::Relaxed),
            dropped_payloads: self.shared.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle that removes one listener from the registry.
pub struct Disposer {
    shared: Arc<Shared>,
    id: u64,
    disposed: AtomicBool,
}

impl Disposer {
    /// Remove the listener. After this returns the listener will not be
    /// invoked again. Safe to call more than once; repeat calls are no-ops
    /// and never touch other listeners.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut entries = self.shared.entries.lock().expect("registry lock poisoned");
        entries.retain(|e| e.id != self.id);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::sample::zeroed_sample;
    use std::sync::atomic::AtomicUsize;

    fn counting_listener(counter: Arc<AtomicUsize>) -> Listener {
        Arc::new(move |_topic, _sample| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_dispatch_reaches_all_listeners_in_order() {
        let registry = ListenerRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let order_a = order.clone();
        let _a = registry.register(Arc::new(move |_, _| {
            order_a.lock().unwrap().push("first");
        }));
        let order_b = order.clone();
        let _b = registry.register(Arc::new(move |_, _| {
            order_b.lock().unwrap().push("second");
        }));

        registry.dispatch("iot/mpu6050pub", &zeroed_sample(1));

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_listeners_receive_identical_sample() {
        let registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..2 {
            let seen = seen.clone();
            let _keep = Box::leak(Box::new(registry.register(Arc::new(
                move |topic: &str, sample: &TelemetrySample| {
                    seen.lock().unwrap().push((topic.to_string(), sample.clone()));
                },
            ))));
        }

        let mut sample = zeroed_sample(42);
        sample.yaw1 = 17.5;
        registry.dispatch("iot/mpu6050pub", &sample);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(seen[0].1.yaw1, 17.5);
    }

    #[test]
    fn test_disposed_listener_is_not_invoked() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let disposer = registry.register(counting_listener(count.clone()));
        registry.dispatch("t", &zeroed_sample(1));
        disposer.dispose();
        registry.dispatch("t", &zeroed_sample(2));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disposer_is_idempotent() {
        let registry = ListenerRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let d1 = registry.register(counting_listener(first.clone()));
        let _d2 = registry.register(counting_listener(second.clone()));

        d1.dispose();
        d1.dispose();
        assert!(d1.is_disposed());

        registry.dispatch("t", &zeroed_sample(1));

        // Double dispose must not remove the other listener
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert_eq!(registry.stats().listeners, 1);
    }

    #[test]
    fn test_panicking_listener_does_not_block_others() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let _bad = registry.register(Arc::new(|_, _| panic!("consumer bug")));
        let _good = registry.register(counting_listener(count.clone()));

        registry.dispatch("t", &zeroed_sample(1));
        registry.dispatch("t", &zeroed_sample(2));

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(registry.stats().listener_faults, 2);
    }

    #[test]
    fn test_closed_registry_drops_dispatches() {
        let registry = ListenerRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let _d = registry.register(counting_listener(count.clone()));

        registry.close();
        registry.dispatch("t", &zeroed_sample(1));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        registry.reopen();
        registry.dispatch("t", &zeroed_sample(2));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_register_during_dispatch_from_listener_does_not_deadlock() {
        let registry = ListenerRegistry::new();
        let registry_inner = registry.clone();
        let late = Arc::new(AtomicUsize::new(0));
        let late_inner = late.clone();

        let _d = registry.register(Arc::new(move |_, _| {
            // Snapshot semantics: this listener joins for the *next* dispatch
            let disposer = registry_inner.register(counting_listener(late_inner.clone()));
            std::mem::forget(disposer);
        }));

        registry.dispatch("t", &zeroed_sample(1));
        assert_eq!(late.load(Ordering::SeqCst), 0);

        registry.dispatch("t", &zeroed_sample(2));
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_counter() {
        let registry = ListenerRegistry::new();
        registry.record_dropped();
        registry.record_dropped();
        assert_eq!(registry.stats().dropped_payloads, 2);
    }
}
