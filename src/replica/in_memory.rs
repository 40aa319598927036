//! InMemoryReplicaStore - replica store keyed by original item id.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ReplicaItem, ReplicaStore, UpsertOutcome};
use crate::error::StoreError;
use crate::event::ItemFields;

struct StoredReplica {
    seq: u64,
    item: ReplicaItem,
}

#[derive(Default)]
struct Storage {
    by_original_id: HashMap<String, StoredReplica>,
    next_seq: u64,
    write_fault: Option<String>,
}

/// In-memory replica store. Clone-friendly via Arc.
///
/// Writes can be made to fail with [`fail_writes`](Self::fail_writes) to
/// exercise the consumer's per-message error path.
#[derive(Clone, Default)]
pub struct InMemoryReplicaStore {
    storage: Arc<RwLock<Storage>>,
}

impl InMemoryReplicaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read("len").map(|s| s.by_original_id.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All rows, oldest first.
    pub fn all(&self) -> Vec<ReplicaItem> {
        let Ok(storage) = self.read("all") else {
            return Vec::new();
        };
        let mut rows: Vec<&StoredReplica> = storage.by_original_id.values().collect();
        rows.sort_by_key(|r| r.seq);
        rows.into_iter().map(|r| r.item.clone()).collect()
    }

    /// Make every subsequent write fail with `StoreError::Unavailable(reason)`.
    pub fn fail_writes(&self, reason: impl Into<String>) {
        if let Ok(mut storage) = self.storage.write() {
            storage.write_fault = Some(reason.into());
        }
    }

    pub fn restore_writes(&self) {
        if let Ok(mut storage) = self.storage.write() {
            storage.write_fault = None;
        }
    }

    fn read(&self, op: &'static str) -> Result<RwLockReadGuard<'_, Storage>, StoreError> {
        self.storage.read().map_err(|_| StoreError::LockPoisoned(op))
    }

    fn write(&self, op: &'static str) -> Result<RwLockWriteGuard<'_, Storage>, StoreError> {
        let storage = self.storage.write().map_err(|_| StoreError::LockPoisoned(op))?;
        match &storage.write_fault {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(storage),
        }
    }
}

impl ReplicaStore for InMemoryReplicaStore {
    fn find_by_original_id(&self, original_id: &str) -> Result<Option<ReplicaItem>, StoreError> {
        let storage = self.read("find_by_original_id")?;
        Ok(storage.by_original_id.get(original_id).map(|r| r.item.clone()))
    }

    fn find_by_name(&self, name: &str) -> Result<Option<ReplicaItem>, StoreError> {
        let storage = self.read("find_by_name")?;
        Ok(storage
            .by_original_id
            .values()
            .filter(|r| r.item.name == name)
            .max_by(|a, b| {
                a.item
                    .created_at
                    .cmp(&b.item.created_at)
                    .then(a.seq.cmp(&b.seq))
            })
            .map(|r| r.item.clone()))
    }

    fn upsert_by_original_id(
        &self,
        original_id: &str,
        fields: &ItemFields,
        last_synced_at: DateTime<Utc>,
    ) -> Result<UpsertOutcome, StoreError> {
        let mut storage = self.write("upsert_by_original_id")?;
        let now = Utc::now();

        if let Some(existing) = storage.by_original_id.get_mut(original_id) {
            existing.item.overwrite(fields, last_synced_at, now);
            return Ok(UpsertOutcome {
                item: existing.item.clone(),
                inserted: false,
            });
        }

        let item = ReplicaItem {
            id: Uuid::new_v4().simple().to_string(),
            name: fields.name.clone(),
            description: fields.description.clone(),
            price: fields.price,
            quantity: fields.quantity,
            original_item_id: original_id.to_string(),
            last_synced_at,
            created_at: now,
            updated_at: now,
        };
        let seq = storage.next_seq;
        storage.next_seq += 1;
        storage.by_original_id.insert(
            original_id.to_string(),
            StoredReplica {
                seq,
                item: item.clone(),
            },
        );
        Ok(UpsertOutcome {
            item,
            inserted: true,
        })
    }

    fn delete_by_original_id(&self, original_id: &str) -> Result<Option<ReplicaItem>, StoreError> {
        let mut storage = self.write("delete_by_original_id")?;
        Ok(storage.by_original_id.remove(original_id).map(|r| r.item))
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.read("ping").map(|_| ())
    }
}
