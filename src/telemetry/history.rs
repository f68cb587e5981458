//! Bounded in-memory window of recent samples
//!
//! Consumers that want "last known" values attach a `History` to the
//! registry; it keeps the newest `capacity` samples and nothing else.

use crate::registry::{Disposer, ListenerRegistry};
use crate::telemetry::TelemetrySample;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default window size, matching the dashboard's retention.
pub const DEFAULT_CAPACITY: usize = 100;

/// Ring buffer of the most recent telemetry samples.
#[derive(Clone)]
pub struct History {
    window: Arc<Mutex<VecDeque<TelemetrySample>>>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe this window to a registry. Dispose the returned handle to
    /// stop recording; the accumulated window stays readable.
    pub fn attach(&self, registry: &ListenerRegistry) -> Disposer {
        let history = self.clone();
        registry.register(Arc::new(move |_topic, sample| {
            history.push(sample.clone());
        }))
    }

    pub fn push(&self, sample: TelemetrySample) {
        let mut window = self.window.lock().expect("history lock poisoned");
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(sample);
    }

    /// Most recent sample, if any arrived yet.
    pub fn latest(&self) -> Option<TelemetrySample> {
        self.window
            .lock()
            .expect("history lock poisoned")
            .back()
            .cloned()
    }

    /// Oldest-to-newest copy of the current window.
    pub fn snapshot(&self) -> Vec<TelemetrySample> {
        self.window
            .lock()
            .expect("history lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.window.lock().expect("history lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
