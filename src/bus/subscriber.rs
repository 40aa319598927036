//! Core subscriber trait for the bus.

use std::time::Duration;

use super::{BusError, Record};

/// Trait for consuming records from a subscribed topic.
///
/// This is a pull-based interface. `poll` blocks until a record is available
/// or the timeout expires; it must not busy-wait.
pub trait Subscriber: Send + Sync {
    /// Poll for the next record.
    fn poll(&self, timeout: Duration) -> Result<Option<Record>, BusError>;

    /// Acknowledge that a record has been processed (commits its offset).
    fn ack(&self, record: &Record) -> Result<(), BusError>;

    /// Reject a record; it will be redelivered on a later poll.
    fn nack(&self, record: &Record, reason: &str) -> Result<(), BusError>;
}
