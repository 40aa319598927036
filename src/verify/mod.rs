//! Cross-store consistency verification.
//!
//! [`VerifyItem::verify_by_name`] looks an item up in the replica, asks the
//! primary for the same name and compares the replicated fields. It never
//! mutates either side and is safe to call repeatedly.

mod compare;
mod primary;

use serde::Serialize;
use tracing::{error, warn};

pub use compare::{differing_fields, fields_match};
#[cfg(feature = "http")]
pub use primary::HttpPrimaryClient;
pub use primary::{PrimaryItemSource, UpstreamError};

use crate::event::ItemFields;
use crate::replica::{ReplicaItem, ReplicaStore};

/// Both sides of a field-level mismatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MismatchDetails {
    pub replica: ItemFields,
    pub primary: ItemFields,
    pub differing_fields: Vec<String>,
}

/// Outcome of one verification.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Match(ReplicaItem),
    NotInReplica,
    NotInPrimary,
    Mismatch(MismatchDetails),
    PrimaryUnavailable(String),
    ReplicaUnavailable(String),
}

impl Verification {
    pub fn is_success(&self) -> bool {
        matches!(self, Verification::Match(_))
    }

    /// Failure reason, `None` on a match.
    pub fn reason(&self) -> Option<String> {
        match self {
            Verification::Match(_) => None,
            Verification::NotInReplica => Some("not found in replica".into()),
            Verification::NotInPrimary => Some("not found in primary".into()),
            Verification::Mismatch(_) => Some("fields do not match".into()),
            Verification::PrimaryUnavailable(cause) => {
                Some(format!("primary store unavailable: {cause}"))
            }
            Verification::ReplicaUnavailable(cause) => {
                Some(format!("replica store unavailable: {cause}"))
            }
        }
    }

    pub fn details(&self) -> Option<&MismatchDetails> {
        match self {
            Verification::Mismatch(details) => Some(details),
            _ => None,
        }
    }

    /// HTTP-style status code for this outcome.
    pub fn status_code(&self) -> u16 {
        match self {
            Verification::Match(_) => 200,
            Verification::NotInReplica | Verification::NotInPrimary | Verification::Mismatch(_) => {
                404
            }
            Verification::PrimaryUnavailable(_) | Verification::ReplicaUnavailable(_) => 500,
        }
    }
}

/// Verification use case over a replica store and the primary's search API.
pub struct VerifyItem<R, C> {
    replica: R,
    primary: C,
}

impl<R: ReplicaStore, C: PrimaryItemSource> VerifyItem<R, C> {
    pub fn new(replica: R, primary: C) -> Self {
        Self { replica, primary }
    }

    pub fn replica(&self) -> &R {
        &self.replica
    }

    pub fn primary(&self) -> &C {
        &self.primary
    }

    pub async fn verify_by_name(&self, name: &str) -> Verification {
        let replica_item = match self.replica.find_by_name(name) {
            Ok(Some(item)) => item,
            Ok(None) => {
                warn!(name, "item not found in replica");
                return Verification::NotInReplica;
            }
            Err(err) => {
                error!(name, error = %err, "replica lookup failed");
                return Verification::ReplicaUnavailable(err.to_string());
            }
        };

        let primary_fields = match self.primary.search_by_name(name).await {
            Ok(Some(fields)) => fields,
            Ok(None) => {
                warn!(name, "item not found in primary");
                return Verification::NotInPrimary;
            }
            Err(err) => {
                error!(name, error = %err, "primary lookup failed");
                return Verification::PrimaryUnavailable(err.to_string());
            }
        };

        let replica_fields = replica_item.fields();
        let differing = differing_fields(&replica_fields, &primary_fields);
        if differing.is_empty() {
            return Verification::Match(replica_item);
        }

        warn!(
            name,
            original_item_id = %replica_item.original_item_id,
            differing = ?differing,
            "replica and primary fields do not match"
        );
        Verification::Mismatch(MismatchDetails {
            replica: replica_fields,
            primary: primary_fields,
            differing_fields: differing.into_iter().map(String::from).collect(),
        })
    }
}
