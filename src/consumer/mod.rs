//! Consumer loop - broker records into the replica state machine.
//!
//! For each record: decode → validate → apply → ack. A bad record or a
//! failed apply is logged and counted, never allowed to stop the loop. Every
//! handled record is acknowledged, so a poison message is not redelivered
//! forever; duplicates from at-least-once delivery are absorbed by the
//! idempotent projector.
//!
//! Records are handled one at a time, so per-partition order (and with it
//! per-item order) is preserved end to end.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::bus::{BusError, Connection, Record, Subscriber};
use crate::error::ValidationError;
use crate::event::{codec, EventType};
use crate::replica::{Applied, ReplicaProjector, ReplicaStore};

/// Per-record result of the consumer loop.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    Applied(Applied),
    /// The payload was rejected before reaching the replica.
    Skipped(ValidationError),
    /// The event was valid but applying it failed.
    Failed {
        item_id: String,
        event_type: EventType,
        error: String,
    },
}

/// Counters reported when a background consumer stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub applied: u64,
    pub skipped: u64,
    pub failed: u64,
    pub polls: u64,
}

impl ConsumerStats {
    fn record(&mut self, outcome: &MessageOutcome) {
        match outcome {
            MessageOutcome::Applied(_) => self.applied += 1,
            MessageOutcome::Skipped(_) => self.skipped += 1,
            MessageOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

pub struct ConsumerLoop<S, R> {
    subscriber: S,
    projector: ReplicaProjector<R>,
}

impl<S, R> ConsumerLoop<S, R>
where
    S: Subscriber + Connection,
    R: ReplicaStore,
{
    pub fn new(subscriber: S, projector: ReplicaProjector<R>) -> Self {
        Self {
            subscriber,
            projector,
        }
    }

    pub fn subscriber(&self) -> &S {
        &self.subscriber
    }

    pub fn projector(&self) -> &ReplicaProjector<R> {
        &self.projector
    }

    /// Decode and apply one record. Does not ack.
    pub fn handle(&self, record: &Record) -> MessageOutcome {
        if record.payload().is_empty() {
            warn!(
                partition = record.partition,
                offset = record.offset,
                "received empty message, skipping"
            );
            return MessageOutcome::Skipped(ValidationError::Malformed("empty message".into()));
        }

        let event = match codec::decode(record.payload()) {
            Ok(event) => event,
            Err(err) => {
                error!(
                    partition = record.partition,
                    offset = record.offset,
                    error = %err,
                    "invalid item event, skipping"
                );
                return MessageOutcome::Skipped(err);
            }
        };

        info!(
            event_type = %event.event_type(),
            item_id = event.item_id(),
            partition = record.partition,
            offset = record.offset,
            "received item event"
        );

        match self.projector.apply(&event) {
            Ok(applied) => MessageOutcome::Applied(applied),
            Err(err) => {
                error!(
                    event_type = %event.event_type(),
                    item_id = event.item_id(),
                    error = %err,
                    "failed to apply item event"
                );
                MessageOutcome::Failed {
                    item_id: event.item_id().to_string(),
                    event_type: event.event_type(),
                    error: err.to_string(),
                }
            }
        }
    }

    /// Wait up to `timeout` for one record, handle it and ack it.
    pub fn poll_once(&self, timeout: Duration) -> Result<Option<MessageOutcome>, BusError> {
        let Some(record) = self.subscriber.poll(timeout)? else {
            return Ok(None);
        };

        let outcome = self.handle(&record);
        if let Err(err) = self.subscriber.ack(&record) {
            warn!(
                partition = record.partition,
                offset = record.offset,
                error = %err,
                "failed to ack record"
            );
        }
        Ok(Some(outcome))
    }

    /// Handle records until a poll of `timeout` comes back empty.
    pub fn drain(&self, timeout: Duration) -> Result<Vec<MessageOutcome>, BusError> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.poll_once(timeout)? {
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

impl<S, R> ConsumerLoop<S, R>
where
    S: Subscriber + Connection + 'static,
    R: ReplicaStore + 'static,
{
    /// Connect the subscriber and run the loop on a background thread.
    ///
    /// Each poll waits at most `poll_interval`, which bounds how long a stop
    /// request waits behind an idle broker.
    pub fn spawn(self, poll_interval: Duration) -> Result<ConsumerHandle, BusError> {
        self.subscriber.connect()?;
        info!(poll_interval_ms = poll_interval.as_millis() as u64, "consumer loop started");

        let (stop_tx, stop_rx) = mpsc::channel();

        let handle = std::thread::spawn(move || {
            let mut stats = ConsumerStats::default();

            loop {
                match stop_rx.try_recv() {
                    Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
                    Err(mpsc::TryRecvError::Empty) => {}
                }

                stats.polls += 1;

                match self.poll_once(poll_interval) {
                    Ok(Some(outcome)) => stats.record(&outcome),
                    Ok(None) => {}
                    Err(err) => {
                        error!(error = %err, "consumer poll failed");
                        // back off without spinning, still responsive to stop
                        match stop_rx.recv_timeout(poll_interval) {
                            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                            Err(RecvTimeoutError::Timeout) => {}
                        }
                    }
                }
            }

            if let Err(err) = self.subscriber.disconnect() {
                warn!(error = %err, "consumer disconnect failed");
            }
            info!(
                applied = stats.applied,
                skipped = stats.skipped,
                failed = stats.failed,
                "consumer stopped"
            );
            stats
        });

        Ok(ConsumerHandle {
            stop_tx,
            handle: Some(handle),
        })
    }
}

/// Handle to a background consumer. Dropping it signals stop without waiting.
pub struct ConsumerHandle {
    stop_tx: mpsc::Sender<()>,
    handle: Option<JoinHandle<ConsumerStats>>,
}

impl ConsumerHandle {
    /// Stop after the in-flight record, disconnect, and return the counters.
    pub fn stop(mut self) -> ConsumerStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => ConsumerStats::default(),
        }
    }

    /// Signal stop without waiting.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(());
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
