//! Consumer service API.
//!
//! - `POST /api/items/search` - verify the replica against the primary, body `{ "name": ... }`
//! - `GET  /health`           - replica store and primary API checks

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use super::primary::SearchRequest;
use super::ApiResponse;
use crate::event::now_timestamp;
use crate::replica::ReplicaStore;
use crate::verify::{PrimaryItemSource, Verification, VerifyItem};

type Shared<R, C> = Arc<VerifyItem<R, C>>;

/// Build the consumer service router.
pub fn consumer_router<R, C>(verify: Shared<R, C>) -> Router
where
    R: ReplicaStore + 'static,
    C: PrimaryItemSource + 'static,
{
    Router::new()
        .route("/api/items/search", post(search_item::<R, C>))
        .route("/health", get(health::<R, C>))
        .with_state(verify)
}

async fn search_item<R: ReplicaStore, C: PrimaryItemSource>(
    State(verify): State<Shared<R, C>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return ApiResponse::rejection(&rejection).with_status(400),
    };
    let Some(name) = request.name() else {
        return ApiResponse::failure("Validation error")
            .error("name: Name is required")
            .with_status(400);
    };

    let verification = verify.verify_by_name(name).await;
    let status = verification.status_code();
    match verification {
        Verification::Match(item) => ApiResponse::ok(item)
            .message("Item found and fields match")
            .with_status(status),
        other => {
            let reason = other.reason().unwrap_or_default();
            let mut body = ApiResponse::failure(reason.clone()).error(reason);
            if let Some(details) = other.details() {
                body = body.details(details);
            }
            body.with_status(status)
        }
    }
}

async fn health<R: ReplicaStore, C: PrimaryItemSource>(
    State(verify): State<Shared<R, C>>,
) -> Response {
    let database = verify.replica().ping().map_err(|e| e.to_string());
    let external_api = verify.primary().health().await.map_err(|e| e.to_string());
    let healthy = database.is_ok() && external_api.is_ok();

    let check = |result: &Result<(), String>| match result {
        Ok(()) => "ok".to_string(),
        Err(err) => err.clone(),
    };
    let body = json!({
        "status": if healthy { "ok" } else { "degraded" },
        "service": "consumer",
        "timestamp": now_timestamp(),
        "checks": {
            "database": check(&database),
            "externalApi": check(&external_api),
        },
    });
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}
