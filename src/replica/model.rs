use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::ItemFields;

/// A row in the replica store, derived from the primary's events.
///
/// `original_item_id` is the join key back to the primary store; at most one
/// replica row exists per original id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    pub original_item_id: String,
    pub last_synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReplicaItem {
    pub fn fields(&self) -> ItemFields {
        ItemFields {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            quantity: self.quantity,
        }
    }

    /// Overwrite the replicated fields from an event snapshot.
    pub(crate) fn overwrite(&mut self, fields: &ItemFields, synced_at: DateTime<Utc>, now: DateTime<Utc>) {
        self.name = fields.name.clone();
        self.description = fields.description.clone();
        self.price = fields.price;
        self.quantity = fields.quantity;
        self.last_synced_at = synced_at;
        self.updated_at = now;
    }
}
