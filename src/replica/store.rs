use chrono::{DateTime, Utc};

use super::ReplicaItem;
use crate::error::StoreError;
use crate::event::ItemFields;

/// Result of an upsert keyed by original id.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub item: ReplicaItem,
    /// `true` when no row existed for the original id.
    pub inserted: bool,
}

/// Replica store capability.
///
/// Upsert and delete are keyed by the primary's id and are idempotent; they
/// are the only concurrency-safety mechanism the replication path uses.
pub trait ReplicaStore: Send + Sync {
    fn find_by_original_id(&self, original_id: &str) -> Result<Option<ReplicaItem>, StoreError>;

    /// First row with exactly this name; the most recently created wins.
    fn find_by_name(&self, name: &str) -> Result<Option<ReplicaItem>, StoreError>;

    /// Match-or-insert by original id, overwriting every replicated field.
    fn upsert_by_original_id(
        &self,
        original_id: &str,
        fields: &ItemFields,
        last_synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError>;

    /// Remove the row for this original id. `None` when there was none.
    fn delete_by_original_id(&self, original_id: &str) -> Result<Option<ReplicaItem>, StoreError>;

    /// Liveness probe for health checks.
    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
