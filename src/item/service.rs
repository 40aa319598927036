//! ItemService - primary-side item operations.
//!
//! Mutations are two-phase:
//! 1. commit the change to the primary store (its failure is the operation's error)
//! 2. notify the event sink, best effort (its outcome is reported, never raised)

use thiserror::Error;
use tracing::warn;

use super::{Item, ItemPatch, NewItem, PrimaryStore};
use crate::error::{StoreError, ValidationError};
use crate::event::{ItemEvent, ItemEventSink, NotifyOutcome};

/// Error type for item operations.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Item not found")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ItemError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ItemError::Validation(_) => 400,
            ItemError::NotFound(_) => 404,
            ItemError::Store(_) => 500,
        }
    }
}

/// A committed mutation and the outcome of its notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub item: Item,
    pub notified: NotifyOutcome,
}

/// Primary-side item operations over a store and an event sink.
pub struct ItemService<S, N> {
    store: S,
    events: N,
}

impl<S: PrimaryStore, N: ItemEventSink> ItemService<S, N> {
    pub fn new(store: S, events: N) -> Self {
        Self { store, events }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn events(&self) -> &N {
        &self.events
    }

    pub fn list(&self) -> Result<Vec<Item>, ItemError> {
        Ok(self.store.find_all()?)
    }

    pub fn get(&self, id: &str) -> Result<Item, ItemError> {
        self.store
            .find_by_id(id)?
            .ok_or_else(|| ItemError::NotFound(id.to_string()))
    }

    pub fn find_by_name(&self, name: &str) -> Result<Item, ItemError> {
        self.store
            .find_by_name(name)?
            .ok_or_else(|| ItemError::NotFound(name.to_string()))
    }

    pub fn create(&self, input: NewItem) -> Result<Mutation, ItemError> {
        input.validate()?;
        let item = self.store.insert(input)?;
        let notified = self.notify(ItemEvent::created(item.id.as_str(), item.fields()));
        Ok(Mutation { item, notified })
    }

    pub fn update(&self, id: &str, patch: ItemPatch) -> Result<Mutation, ItemError> {
        patch.validate()?;
        let item = self
            .store
            .update(id, patch)?
            .ok_or_else(|| ItemError::NotFound(id.to_string()))?;
        let notified = self.notify(ItemEvent::updated(item.id.as_str(), item.fields()));
        Ok(Mutation { item, notified })
    }

    pub fn delete(&self, id: &str) -> Result<Mutation, ItemError> {
        let item = self
            .store
            .delete(id)?
            .ok_or_else(|| ItemError::NotFound(id.to_string()))?;
        let notified = self.notify(ItemEvent::deleted(item.id.as_str()));
        Ok(Mutation { item, notified })
    }

    fn notify(&self, event: ItemEvent) -> NotifyOutcome {
        let item_id = event.item_id().to_string();
        let event_type = event.event_type();
        let outcome = self.events.notify(event);
        if let NotifyOutcome::Failed(reason) = &outcome {
            warn!(
                item_id = %item_id,
                %event_type,
                reason = %reason,
                "mutation committed without notification"
            );
        }
        outcome
    }
}
