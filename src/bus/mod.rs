//! Message bus - broker abstractions for item lifecycle events
//!
//! This module provides the traits the replication pipeline is written
//! against and an in-memory partitioned broker that implements them.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐        ┌──────────────────────────────┐
//! │ ItemEventPublisher (primary) │        │ ConsumerLoop (replica side)  │
//! └──────────────────────────────┘        └──────────────────────────────┘
//!                │                                        ▲
//!                ▼                                        │
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │          Publisher / Subscriber / Connection traits                 │
//! │  Publisher:  publish(message) / publish_batch(messages)             │
//! │  Subscriber: poll(timeout) / ack(record) / nack(record)             │
//! │  Connection: connect() / disconnect() / is_connected()              │
//! └─────────────────────────────────────────────────────────────────────┘
//!          │                                  │
//!          ▼                                  ▼
//! ┌──────────────────┐               ┌─────────────────────┐
//! │  InMemoryBroker  │               │   Kafka client      │
//! │   (included)     │               │    (external)       │
//! └──────────────────┘               └─────────────────────┘
//! ```
//!
//! Ordering contract: a message's `key` selects its partition, and records
//! of one partition are delivered in offset order. Nothing is promised
//! across keys.

mod connection;
mod in_memory_broker;
mod message;
mod publisher;
mod subscriber;

pub use connection::{Connection, ConnectionState};
pub use in_memory_broker::{InMemoryBroker, InMemoryConsumer, InMemoryProducer};
pub use message::{Message, Record};
pub use publisher::{BusError, Publisher};
pub use subscriber::Subscriber;
