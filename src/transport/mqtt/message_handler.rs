//! Event routing and inbound payload handling
//!
//! Routing decisions are pure; the [`SampleDispatcher`] is the single point
//! where wire bytes become validated samples and enter the listener registry.
//! Anything malformed, non-finite, or out of time order is dropped at this
//! boundary and never reaches a listener.

use crate::registry::ListenerRegistry;
use crate::telemetry::TelemetrySample;
use rumqttc::{Event, Packet};
use tracing::{debug, warn};

/// Routing decisions for transport events.
#[derive(Debug, Clone)]
pub enum EventRoute {
    /// Handshake acknowledged - subscribe and report connected
    ConnectionAcknowledged,
    /// Payload received on a subscribed topic
    MessageReceived {
        topic: String,
        payload: Vec<u8>,
        retain: bool,
    },
    /// Broker initiated disconnect
    Disconnected,
    /// Subscription confirmed
    SubscriptionConfirmed,
    /// Keep-alive and other infrastructure traffic
    InfrastructureEvent,
    /// Outgoing packet (handled by the event loop)
    OutgoingEvent,
}

/// Route one transport event (pure function).
pub fn route_event(event: &Event) -> EventRoute {
    match event {
        Event::Incoming(incoming) => match incoming {
            Packet::ConnAck(_) => EventRoute::ConnectionAcknowledged,
            Packet::Publish(publish) => EventRoute::MessageReceived {
                topic: publish.topic.clone(),
                payload: publish.payload.to_vec(),
                retain: publish.retain,
            },
            Packet::Disconnect => EventRoute::Disconnected,
            Packet::SubAck(_) => EventRoute::SubscriptionConfirmed,
            _ => EventRoute::InfrastructureEvent,
        },
        Event::Outgoing(_) => EventRoute::OutgoingEvent,
    }
}

/// Whether a publish should be considered at all (pure function). Retained
/// messages are stale by definition and replaying them would violate the
/// non-decreasing timestamp guarantee.
pub fn should_process(topic: &str, retain: bool, expected_topic: &str) -> bool {
    if retain {
        debug!(topic, "Ignoring retained message");
        return false;
    }
    if topic != expected_topic {
        debug!(topic, expected_topic, "Ignoring message on unexpected topic");
        return false;
    }
    true
}

/// Validating gate between the wire and the listener registry for one live
/// connection. Tracks the last accepted timestamp so a single source never
/// delivers samples out of time order.
pub struct SampleDispatcher {
    registry: ListenerRegistry,
    topic: String,
    last_timestamp: Option<u64>,
}

impl SampleDispatcher {
    pub fn new(registry: ListenerRegistry, topic: String) -> Self {
        Self {
            registry,
            topic,
            last_timestamp: None,
        }
    }

    /// Decode, validate, and fan out one inbound publish. Rejected payloads
    /// are counted and dropped silently; they never crash the event loop.
    pub fn handle(&mut self, topic: &str, payload: &[u8], retain: bool) {
        if !should_process(topic, retain, &self.topic) {
            return;
        }

        let sample = match TelemetrySample::decode(payload) {
            Ok(sample) => sample,
            Err(e) => {
                self.registry.record_dropped();
                warn!(topic, error = %e, "Dropping malformed telemetry payload");
                return;
            }
        };

        if let Some(last) = self.last_timestamp {
            if sample.timestamp < last {
                self.registry.record_dropped();
                warn!(
                    topic,
                    timestamp = sample.timestamp,
                    last,
                    "Dropping out-of-order telemetry payload"
                );
                return;
            }
        }
        self.last_timestamp = Some(sample.timestamp);

        self.registry.dispatch(&self.topic, &sample);
    }
}
