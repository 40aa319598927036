use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, Violations};
use crate::event::ItemFields;

pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// An item in the primary store (the system of record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Snapshot of the replicated fields.
    pub fn fields(&self) -> ItemFields {
        ItemFields {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            quantity: self.quantity,
        }
    }
}

/// Input for creating an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl NewItem {
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

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Violations::default();
        check_name(&self.name, &mut violations);
        check_optionals(
            self.description.as_deref(),
            self.price,
            self.quantity,
            &mut violations,
        );
        violations.finish()
    }
}

/// Partial update of an item. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl ItemPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Violations::default();
        if let Some(name) = &self.name {
            check_name(name, &mut violations);
        }
        check_optionals(
            self.description.as_deref(),
            self.price,
            self.quantity,
            &mut violations,
        );
        violations.finish()
    }

    /// Apply present fields to `item` and bump `updated_at`.
    pub fn apply(&self, item: &mut Item, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(description) = &self.description {
            item.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            item.price = Some(price);
        }
        if let Some(quantity) = self.quantity {
            item.quantity = Some(quantity);
        }
        item.updated_at = now;
    }
}

fn check_name(name: &str, violations: &mut Violations) {
    let chars = name.chars().count();
    if chars == 0 {
        violations.push("name", "Name is required");
    } else if chars > NAME_MAX_CHARS {
        violations.push(
            "name",
            format!("Name must be at most {} characters", NAME_MAX_CHARS),
        );
    }
}

fn check_optionals(
    description: Option<&str>,
    price: Option<f64>,
    quantity: Option<i64>,
    violations: &mut Violations,
) {
    if description.is_some_and(|d| d.chars().count() > DESCRIPTION_MAX_CHARS) {
        violations.push(
            "description",
            format!(
                "Description must be at most {} characters",
                DESCRIPTION_MAX_CHARS
            ),
        );
    }
    if price.is_some_and(|p| !(p.is_finite() && p > 0.0)) {
        violations.push("price", "Price must be a positive number");
    }
    if quantity.is_some_and(|q| q < 0) {
        violations.push("quantity", "Quantity must be a non-negative integer");
    }
}
