//! Item lifecycle events.
//!
//! An [`ItemEvent`] describes a create/update/delete that happened in the
//! primary store. CREATED and UPDATED carry a typed snapshot of the item's
//! fields; DELETED carries only the id. Payloads are checked by
//! [`codec::decode`] at the consumer boundary and by [`codec::encode`] before
//! they leave the publisher, so an untyped map never reaches the replica.

pub mod codec;
mod publisher;

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub use publisher::{ItemEventPublisher, ItemEventSink, NotifyOutcome};

/// Wire-level event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Created,
    Updated,
    Deleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Created => "ITEM_CREATED",
            EventType::Updated => "ITEM_UPDATED",
            EventType::Deleted => "ITEM_DELETED",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ITEM_CREATED" => Ok(EventType::Created),
            "ITEM_UPDATED" => Ok(EventType::Updated),
            "ITEM_DELETED" => Ok(EventType::Deleted),
            other => Err(UnknownEventType(other.to_string())),
        }
    }
}

/// The replicated field set of an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFields {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

impl ItemFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

/// A lifecycle event for one item, keyed by the primary store's id.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemEvent {
    Created {
        item_id: String,
        data: ItemFields,
        timestamp: String,
    },
    Updated {
        item_id: String,
        data: ItemFields,
        timestamp: String,
    },
    Deleted {
        item_id: String,
        timestamp: String,
    },
}

impl ItemEvent {
    pub fn created(item_id: impl Into<String>, data: ItemFields) -> Self {
        ItemEvent::Created {
            item_id: item_id.into(),
            data,
            timestamp: now_timestamp(),
        }
    }

    pub fn updated(item_id: impl Into<String>, data: ItemFields) -> Self {
        ItemEvent::Updated {
            item_id: item_id.into(),
            data,
            timestamp: now_timestamp(),
        }
    }

    pub fn deleted(item_id: impl Into<String>) -> Self {
        ItemEvent::Deleted {
            item_id: item_id.into(),
            timestamp: now_timestamp(),
        }
    }

    /// Replace the emission timestamp.
    pub fn at(mut self, at: impl Into<String>) -> Self {
        match &mut self {
            ItemEvent::Created { timestamp, .. }
            | ItemEvent::Updated { timestamp, .. }
            | ItemEvent::Deleted { timestamp, .. } => *timestamp = at.into(),
        }
        self
    }

    pub fn event_type(&self) -> EventType {
        match self {
            ItemEvent::Created { .. } => EventType::Created,
            ItemEvent::Updated { .. } => EventType::Updated,
            ItemEvent::Deleted { .. } => EventType::Deleted,
        }
    }

    pub fn item_id(&self) -> &str {
        match self {
            ItemEvent::Created { item_id, .. }
            | ItemEvent::Updated { item_id, .. }
            | ItemEvent::Deleted { item_id, .. } => item_id,
        }
    }

    pub fn timestamp(&self) -> &str {
        match self {
            ItemEvent::Created { timestamp, .. }
            | ItemEvent::Updated { timestamp, .. }
            | ItemEvent::Deleted { timestamp, .. } => timestamp,
        }
    }

    /// Field snapshot, absent for DELETED.
    pub fn data(&self) -> Option<&ItemFields> {
        match self {
            ItemEvent::Created { data, .. } | ItemEvent::Updated { data, .. } => Some(data),
            ItemEvent::Deleted { .. } => None,
        }
    }
}

/// Current time as an ISO-8601 string with millisecond precision and `Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
