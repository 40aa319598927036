//! Primary store side: items, their validation, and the mutation service
//! that publishes lifecycle events.

mod in_memory;
mod model;
mod service;
mod store;

pub use in_memory::InMemoryItemStore;
pub use model::{Item, ItemPatch, NewItem, DESCRIPTION_MAX_CHARS, NAME_MAX_CHARS};
pub use service::{ItemError, ItemService, Mutation};
pub use store::PrimaryStore;
