//! Field comparison between a replica row and the primary's record.
//!
//! - `name`: literal.
//! - `description`: trimmed, absent counts as `""`.
//! - `price`, `quantity`: absent counts as null; `0` is not null.

use crate::event::ItemFields;

/// Names of the fields that differ, in `name, description, price, quantity` order.
pub fn differing_fields(replica: &ItemFields, primary: &ItemFields) -> Vec<&'static str> {
    let mut differing = Vec::new();
    if replica.name != primary.name {
        differing.push("name");
    }
    if normalized_description(replica) != normalized_description(primary) {
        differing.push("description");
    }
    if replica.price != primary.price {
        differing.push("price");
    }
    if replica.quantity != primary.quantity {
        differing.push("quantity");
    }
    differing
}

pub fn fields_match(replica: &ItemFields, primary: &ItemFields) -> bool {
    differing_fields(replica, primary).is_empty()
}

fn normalized_description(fields: &ItemFields) -> &str {
    fields.description.as_deref().map_or("", str::trim)
}
