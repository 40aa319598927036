//! Replica store side: the derived, eventually-consistent copy of items and
//! the state machine that keeps it in step with the primary's events.

mod in_memory;
mod model;
mod projector;
mod store;

pub use in_memory::InMemoryReplicaStore;
pub use model::ReplicaItem;
pub use projector::{Applied, ApplyError, ReplicaProjector};
pub use store::{ReplicaStore, UpsertOutcome};
