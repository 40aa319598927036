//! InMemoryItemStore - HashMap-backed primary store for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use super::{Item, ItemPatch, NewItem, PrimaryStore};
use crate::error::StoreError;

struct StoredItem {
    /// Insertion order, breaks ties between equal `created_at` values.
    seq: u64,
    item: Item,
}

#[derive(Default)]
struct Storage {
    items: HashMap<String, StoredItem>,
    next_seq: u64,
}

/// In-memory primary store. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryItemStore {
    storage: Arc<RwLock<Storage>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read("len").map(|s| s.items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self, op: &'static str) -> Result<RwLockReadGuard<'_, Storage>, StoreError> {
        self.storage.read().map_err(|_| StoreError::LockPoisoned(op))
    }

    fn write(&self, op: &'static str) -> Result<RwLockWriteGuard<'_, Storage>, StoreError> {
        self.storage.write().map_err(|_| StoreError::LockPoisoned(op))
    }

    fn newest_first(storage: &Storage) -> Vec<&StoredItem> {
        let mut stored: Vec<&StoredItem> = storage.items.values().collect();
        stored.sort_by(|a, b| {
            b.item
                .created_at
                .cmp(&a.item.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        stored
    }
}

impl PrimaryStore for InMemoryItemStore {
    fn find_all(&self) -> Result<Vec<Item>, StoreError> {
        let storage = self.read("find_all")?;
        Ok(Self::newest_first(&storage)
            .into_iter()
            .map(|s| s.item.clone())
            .collect())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Item>, StoreError> {
        let storage = self.read("find_by_id")?;
        Ok(storage.items.get(id).map(|s| s.item.clone()))
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Item>, StoreError> {
        let storage = self.read("find_by_name")?;
        Ok(Self::newest_first(&storage)
            .into_iter()
            .find(|s| s.item.name == name)
            .map(|s| s.item.clone()))
    }

    fn insert(&self, input: NewItem) -> Result<Item, StoreError> {
        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4().simple().to_string(),
            name: input.name,
            description: input.description,
            price: input.price,
            quantity: input.quantity,
            created_at: now,
            updated_at: now,
        };

        let mut storage = self.write("insert")?;
        let seq = storage.next_seq;
        storage.next_seq += 1;
        storage.items.insert(
            item.id.clone(),
            StoredItem {
                seq,
                item: item.clone(),
            },
        );
        Ok(item)
    }

    fn update(&self, id: &str, patch: ItemPatch) -> Result<Option<Item>, StoreError> {
        let mut storage = self.write("update")?;
        Ok(storage.items.get_mut(id).map(|stored| {
            patch.apply(&mut stored.item, Utc::now());
            stored.item.clone()
        }))
    }

    fn delete(&self, id: &str) -> Result<Option<Item>, StoreError> {
        let mut storage = self.write("delete")?;
        Ok(storage.items.remove(id).map(|s| s.item))
    }

    fn ping(&self) -> Result<(), StoreError> {
        self.read("ping").map(|_| ())
    }
}
