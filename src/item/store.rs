use super::{Item, ItemPatch, NewItem};
use crate::error::StoreError;

/// Primary store capability - the system of record for items.
///
/// Implementations assign ids and timestamps. Persistence mechanics are
/// theirs; callers only rely on this contract.
pub trait PrimaryStore: Send + Sync {
    /// All items, newest first.
    fn find_all(&self) -> Result<Vec<Item>, StoreError>;

    fn find_by_id(&self, id: &str) -> Result<Option<Item>, StoreError>;

    /// First item with exactly this name; the most recently created wins.
    fn find_by_name(&self, name: &str) -> Result<Option<Item>, StoreError>;

    fn insert(&self, input: NewItem) -> Result<Item, StoreError>;

    /// Apply a partial update. `None` if no item has this id.
    fn update(&self, id: &str, patch: ItemPatch) -> Result<Option<Item>, StoreError>;

    /// Remove an item, returning what was removed.
    fn delete(&self, id: &str) -> Result<Option<Item>, StoreError>;

    /// Liveness probe for health checks.
    fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
