use std::fmt;

use thiserror::Error;

/// Error raised by the primary and replica store capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A single rejected field and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Malformed event payloads and malformed requests. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The payload could not be read as a structured object at all.
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// The payload parsed but one or more fields are invalid.
    #[error("invalid fields: {}", join_violations(.0))]
    Fields(Vec<FieldViolation>),
}

impl ValidationError {
    /// Names of the offending fields (empty for `Malformed`).
    pub fn fields(&self) -> Vec<&str> {
        self.violations().iter().map(|v| v.field.as_str()).collect()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            ValidationError::Malformed(_) => &[],
            ValidationError::Fields(violations) => violations,
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Collects field violations so every problem is reported, not just the first.
#[derive(Debug, Default)]
pub(crate) struct Violations(Vec<FieldViolation>);

impl Violations {
    pub(crate) fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn finish(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::Fields(self.0))
        }
    }
}
