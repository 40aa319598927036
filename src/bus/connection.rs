//! Scoped connect/disconnect lifecycle for broker client handles.

use std::sync::atomic::{AtomicU8, Ordering};

use super::BusError;

/// Explicit connection lifecycle for a broker client.
///
/// Connect before the first publish/poll, disconnect on shutdown. Both
/// operations are idempotent: connecting an open handle and disconnecting a
/// closed one are no-ops.
pub trait Connection: Send + Sync {
    fn connect(&self) -> Result<(), BusError>;

    fn disconnect(&self) -> Result<(), BusError>;

    fn is_connected(&self) -> bool;
}

const IDLE: u8 = 0;
const OPEN: u8 = 1;
const CLOSED: u8 = 2;

/// Lifecycle state shared by client handles.
///
/// `Idle → Open → Closed`. A closed handle cannot be reopened; build a new
/// client instead.
#[derive(Debug, Default)]
pub struct ConnectionState(AtomicU8);

impl ConnectionState {
    pub fn new() -> Self {
        Self(AtomicU8::new(IDLE))
    }

    /// Move to `Open`. Returns `Ok(true)` on the transition, `Ok(false)` if
    /// already open.
    pub fn open(&self) -> Result<bool, BusError> {
        match self
            .0
            .compare_exchange(IDLE, OPEN, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(true),
            Err(OPEN) => Ok(false),
            Err(_) => Err(BusError::ConnectionFailed(
                "client handle already closed".into(),
            )),
        }
    }

    /// Move to `Closed`. Returns `true` only for the call that actually
    /// closed an open handle.
    pub fn close(&self) -> bool {
        self.0
            .compare_exchange(OPEN, CLOSED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_open(&self) -> bool {
        self.0.load(Ordering::Acquire) == OPEN
    }

    /// Error out unless the handle is open.
    pub fn ensure_open(&self) -> Result<(), BusError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(BusError::NotConnected)
        }
    }
}
