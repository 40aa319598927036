use tracing::{error, info};
use uuid::Uuid;

use super::{codec, ItemEvent};
use crate::bus::{BusError, Connection, Message, Publisher};

/// Result of a best-effort notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Published,
    Failed(String),
}

impl NotifyOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, NotifyOutcome::Published)
    }
}

/// Best-effort sink for item lifecycle events.
///
/// `notify` never fails: a delivery problem is reported through the returned
/// outcome and the log, and the caller's mutation stands.
pub trait ItemEventSink: Send + Sync {
    fn notify(&self, event: ItemEvent) -> NotifyOutcome;

    /// Whether the sink can currently deliver (used by health checks).
    fn is_ready(&self) -> bool {
        true
    }
}

/// Publishes item events to a broker topic, keyed by item id.
///
/// Owns its producer handle. Call [`connect`](Self::connect) before the first
/// publish and [`disconnect`](Self::disconnect) on shutdown; both are
/// idempotent.
pub struct ItemEventPublisher<P> {
    producer: P,
    topic: String,
}

impl<P: Publisher + Connection> ItemEventPublisher<P> {
    pub fn new(producer: P, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn connect(&self) -> Result<(), BusError> {
        self.producer.connect()
    }

    pub fn disconnect(&self) -> Result<(), BusError> {
        self.producer.disconnect()
    }

    pub fn is_connected(&self) -> bool {
        self.producer.is_connected()
    }

    /// Send one event. The item id is the message key, so every event for
    /// one item lands on the same partition in publish order.
    pub fn publish(&self, event: &ItemEvent) -> Result<(), BusError> {
        let payload =
            codec::encode(event).map_err(|e| BusError::SerializationFailed(e.to_string()))?;

        let message = Message::new(Uuid::new_v4().to_string(), self.topic.as_str(), payload)
            .with_key(event.item_id())
            .with_header("eventType", event.event_type().as_str());

        self.producer.publish(message)?;

        info!(
            event_type = %event.event_type(),
            item_id = event.item_id(),
            topic = %self.topic,
            "item event published"
        );
        Ok(())
    }
}

impl<P: Publisher + Connection> ItemEventSink for ItemEventPublisher<P> {
    fn notify(&self, event: ItemEvent) -> NotifyOutcome {
        match self.publish(&event) {
            Ok(()) => NotifyOutcome::Published,
            Err(err) => {
                error!(
                    event_type = %event.event_type(),
                    item_id = event.item_id(),
                    error = %err,
                    "failed to publish item event"
                );
                NotifyOutcome::Failed(err.to_string())
            }
        }
    }

    fn is_ready(&self) -> bool {
        self.is_connected()
    }
}
