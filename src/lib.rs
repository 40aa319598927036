//! Item replication over a message broker.
//!
//! The primary side commits item mutations and publishes lifecycle events
//! keyed by item id. The consumer side applies those events to a replica
//! store with idempotent upserts and deletes, and can verify on demand that
//! a replica row still agrees with the primary.
//!
//! ```text
//! ItemService ──commit──▶ PrimaryStore
//!      │ notify (best effort)
//!      ▼
//! ItemEventPublisher ──▶ broker topic (key = item id) ──▶ ConsumerLoop
//!                                                            │ apply
//!                                                            ▼
//!              VerifyItem ◀── ReplicaStore ◀── ReplicaProjector
//!                  │
//!                  └──▶ PrimaryItemSource (primary's search API)
//! ```

pub mod bus;
pub mod config;
pub mod consumer;
pub mod error;
pub mod event;
#[cfg(feature = "http")]
pub mod http;
pub mod item;
pub mod replica;
pub mod telemetry;
pub mod verify;

pub use bus::{BusError, InMemoryBroker};
pub use config::{Config, ConfigError};
pub use consumer::{ConsumerHandle, ConsumerLoop, ConsumerStats, MessageOutcome};
pub use error::{FieldViolation, StoreError, ValidationError};
pub use event::{EventType, ItemEvent, ItemEventPublisher, ItemEventSink, ItemFields, NotifyOutcome};
pub use item::{InMemoryItemStore, Item, ItemError, ItemPatch, ItemService, Mutation, NewItem, PrimaryStore};
pub use replica::{
    Applied, ApplyError, InMemoryReplicaStore, ReplicaItem, ReplicaProjector, ReplicaStore,
};
#[cfg(feature = "http")]
pub use verify::HttpPrimaryClient;
pub use verify::{PrimaryItemSource, UpstreamError, Verification, VerifyItem};
