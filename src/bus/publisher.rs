//! Core publisher trait and bus error type.

use thiserror::Error;

use super::Message;

/// Error type for bus operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Connection to the broker failed or the handle was closed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// The handle has not been connected (or has been disconnected)
    #[error("Not connected to broker")]
    NotConnected,
    /// Serialization of the message failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
    /// The broker rejected the message
    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// Trait for publishing messages to a broker.
///
/// Implementations route each message to a partition by its key, so that
/// messages sharing a key are delivered in publish order.
pub trait Publisher: Send + Sync {
    /// Publish a single message.
    fn publish(&self, message: Message) -> Result<(), BusError>;

    /// Publish multiple messages.
    ///
    /// Default implementation publishes messages sequentially and stops at
    /// the first failure.
    fn publish_batch(&self, messages: Vec<Message>) -> Result<(), BusError> {
        for message in messages {
            self.publish(message)?;
        }
        Ok(())
    }
}
