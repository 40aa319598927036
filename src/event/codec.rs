//! JSON wire codec for item lifecycle events.
//!
//! ```text
//! { "eventType": "ITEM_CREATED" | "ITEM_UPDATED" | "ITEM_DELETED",
//!   "itemId":    "<origin id>",
//!   "data":      { "name": "...", "description"?: "...", "price"?: n, "quantity"?: n },
//!   "timestamp": "<ISO-8601>" }
//! ```
//!
//! `timestamp` only has to be a string; consumers treat it as an opaque date
//! source.

use serde::Serialize;
use serde_json::{Map, Value};

use super::{EventType, ItemEvent, ItemFields};
use crate::error::{ValidationError, Violations};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent<'a> {
    event_type: &'static str,
    item_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a ItemFields>,
    timestamp: &'a str,
}

/// Decode and validate a raw broker payload.
pub fn decode(payload: &[u8]) -> Result<ItemEvent, ValidationError> {
    if payload.is_empty() {
        return Err(ValidationError::Malformed("empty message".into()));
    }
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| ValidationError::Malformed(e.to_string()))?;
    validate(&value)
}

/// Validate an already-parsed payload.
pub fn validate(value: &Value) -> Result<ItemEvent, ValidationError> {
    let Some(object) = value.as_object() else {
        return Err(ValidationError::Malformed("expected a JSON object".into()));
    };

    let mut violations = Violations::default();

    let event_type = match object.get("eventType") {
        Some(Value::String(raw)) => match raw.parse::<EventType>() {
            Ok(event_type) => Some(event_type),
            Err(_) => {
                violations.push(
                    "eventType",
                    format!(
                        "expected one of ITEM_CREATED, ITEM_UPDATED, ITEM_DELETED, got {:?}",
                        raw
                    ),
                );
                None
            }
        },
        other => {
            violations.push("eventType", missing_or_mistyped(other, "a string"));
            None
        }
    };

    let item_id = match object.get("itemId") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::String(_)) => {
            violations.push("itemId", "must not be empty");
            None
        }
        other => {
            violations.push("itemId", missing_or_mistyped(other, "a string"));
            None
        }
    };

    let timestamp = match object.get("timestamp") {
        Some(Value::String(ts)) => Some(ts.clone()),
        other => {
            violations.push("timestamp", missing_or_mistyped(other, "a string"));
            None
        }
    };

    let data = match event_type {
        Some(EventType::Created) | Some(EventType::Updated) => match object.get("data") {
            Some(Value::Object(fields)) => decode_fields(fields, &mut violations),
            Some(Value::Null) | None => {
                violations.push("data", "required for ITEM_CREATED and ITEM_UPDATED");
                None
            }
            Some(_) => {
                violations.push("data", "expected an object");
                None
            }
        },
        _ => None,
    };

    violations.finish()?;

    match (event_type, item_id, timestamp, data) {
        (Some(EventType::Created), Some(item_id), Some(timestamp), Some(data)) => {
            Ok(ItemEvent::Created {
                item_id,
                data,
                timestamp,
            })
        }
        (Some(EventType::Updated), Some(item_id), Some(timestamp), Some(data)) => {
            Ok(ItemEvent::Updated {
                item_id,
                data,
                timestamp,
            })
        }
        (Some(EventType::Deleted), Some(item_id), Some(timestamp), _) => Ok(ItemEvent::Deleted {
            item_id,
            timestamp,
        }),
        _ => Err(ValidationError::Malformed("incomplete event".into())),
    }
}

/// Validate and serialize an event for the wire.
///
/// Applies the same rules as [`decode`], so an event the consumer would
/// reject is never published.
pub fn encode(event: &ItemEvent) -> Result<Vec<u8>, ValidationError> {
    let wire = WireEvent {
        event_type: event.event_type().as_str(),
        item_id: event.item_id(),
        data: event.data(),
        timestamp: event.timestamp(),
    };
    let value =
        serde_json::to_value(&wire).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    validate(&value)?;
    serde_json::to_vec(&value).map_err(|e| ValidationError::Malformed(e.to_string()))
}

fn decode_fields(fields: &Map<String, Value>, violations: &mut Violations) -> Option<ItemFields> {
    let before = violations.len();

    let name = match fields.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        Some(Value::String(_)) => {
            violations.push("data.name", "must not be empty");
            String::new()
        }
        other => {
            violations.push("data.name", missing_or_mistyped(other, "a string"));
            String::new()
        }
    };

    let description = match fields.get("description") {
        None | Some(Value::Null) => None,
        Some(Value::String(description)) => Some(description.clone()),
        Some(_) => {
            violations.push("data.description", "expected a string");
            None
        }
    };

    let price = match fields.get("price") {
        None | Some(Value::Null) => None,
        Some(Value::Number(price)) => price.as_f64(),
        Some(_) => {
            violations.push("data.price", "expected a number");
            None
        }
    };

    let quantity = match fields.get("quantity") {
        None | Some(Value::Null) => None,
        Some(Value::Number(quantity)) => match integral(quantity) {
            Some(quantity) => Some(quantity),
            None => {
                violations.push("data.quantity", "expected an integer");
                None
            }
        },
        Some(_) => {
            violations.push("data.quantity", "expected an integer");
            None
        }
    };

    (violations.len() == before).then_some(ItemFields {
        name,
        description,
        price,
        quantity,
    })
}

fn integral(number: &serde_json::Number) -> Option<i64> {
    if let Some(n) = number.as_i64() {
        return Some(n);
    }
    number
        .as_f64()
        .filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
        .map(|n| n as i64)
}

fn missing_or_mistyped(value: Option<&Value>, expected: &str) -> String {
    match value {
        None | Some(Value::Null) => "required".to_string(),
        Some(_) => format!("expected {}", expected),
    }
}
