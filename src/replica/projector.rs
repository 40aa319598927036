//! Replica state machine.
//!
//! Each original id is either absent or present in the replica store:
//!
//! | state   | event             | result                         |
//! |---------|-------------------|--------------------------------|
//! | absent  | CREATED / UPDATED | present (insert)               |
//! | present | CREATED / UPDATED | present (overwrite, last wins) |
//! | present | DELETED           | absent                         |
//! | absent  | DELETED           | absent, warning logged         |
//!
//! Events are applied in arrival order; timestamps are never compared.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use super::ReplicaStore;
use crate::error::StoreError;
use crate::event::{EventType, ItemEvent};

/// What applying one event did to the replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Upserted { inserted: bool },
    Deleted,
    /// DELETED for an original id with no row.
    AlreadyAbsent,
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("replica store error: {0}")]
    Store(#[from] StoreError),
}

/// Applies item events to a replica store.
pub struct ReplicaProjector<S> {
    store: S,
}

impl<S: ReplicaStore> ReplicaProjector<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn apply(&self, event: &ItemEvent) -> Result<Applied, ApplyError> {
        match event {
            ItemEvent::Created {
                item_id,
                data,
                timestamp,
            }
            | ItemEvent::Updated {
                item_id,
                data,
                timestamp,
            } => {
                let synced_at = synced_at(timestamp, item_id, event.event_type());
                let outcome = self.store.upsert_by_original_id(item_id, data, synced_at)?;
                debug!(
                    item_id = %item_id,
                    event_type = %event.event_type(),
                    inserted = outcome.inserted,
                    "replica upserted"
                );
                Ok(Applied::Upserted {
                    inserted: outcome.inserted,
                })
            }
            ItemEvent::Deleted { item_id, .. } => {
                match self.store.delete_by_original_id(item_id)? {
                    Some(_) => {
                        debug!(item_id = %item_id, "replica deleted");
                        Ok(Applied::Deleted)
                    }
                    None => {
                        warn!(item_id = %item_id, "item not found in replica for deletion");
                        Ok(Applied::AlreadyAbsent)
                    }
                }
            }
        }
    }
}

/// Parse the event timestamp, falling back to now when it is not RFC 3339.
fn synced_at(timestamp: &str, item_id: &str, event_type: EventType) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(err) => {
            warn!(
                item_id,
                %event_type,
                timestamp,
                error = %err,
                "unparseable event timestamp, using processing time"
            );
            Utc::now()
        }
    }
}
