use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ValidationError;

/// JSON envelope shared by both services.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiResponse {
    pub fn ok(data: impl Serialize) -> Self {
        Self {
            success: true,
            data: Some(to_value(data)),
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn details(mut self, details: impl Serialize) -> Self {
        self.details = Some(to_value(details));
        self
    }

    /// 400 envelope listing each violated field.
    pub fn validation(err: &ValidationError) -> Self {
        let violations: Vec<Value> = err
            .violations()
            .iter()
            .map(|v| json!({ "field": v.field, "message": v.message }))
            .collect();
        let failure = Self::failure("Validation error").error(err.to_string());
        if violations.is_empty() {
            failure
        } else {
            failure.details(violations)
        }
    }

    /// 400 envelope for a body axum could not read as JSON.
    pub fn rejection(rejection: &JsonRejection) -> Self {
        Self::failure("Validation error").error(rejection.body_text())
    }

    pub fn with_status(self, status: u16) -> Response {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

fn to_value(value: impl Serialize) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
