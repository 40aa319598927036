//! Primary API.
//!
//! ## Routes
//!
//! - `GET    /api/items`        - all items, newest first
//! - `POST   /api/items`        - create (201)
//! - `POST   /api/items/search` - find by name, body `{ "name": ... }`
//! - `GET    /api/items/:id`    - one item
//! - `PUT    /api/items/:id`    - partial update
//! - `DELETE /api/items/:id`    - delete
//! - `GET    /health`           - store and broker checks
//!
//! Mutations answer as soon as the store commits; the event notification
//! outcome never changes the status code.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::ApiResponse;
use crate::event::{now_timestamp, ItemEventSink};
use crate::item::{ItemError, ItemPatch, ItemService, NewItem, PrimaryStore};

type Shared<S, N> = Arc<ItemService<S, N>>;

/// Build the primary API router.
pub fn primary_router<S, N>(service: Shared<S, N>) -> Router
where
    S: PrimaryStore + 'static,
    N: ItemEventSink + 'static,
{
    Router::new()
        .route(
            "/api/items",
            get(list_items::<S, N>).post(create_item::<S, N>),
        )
        .route("/api/items/search", post(search_item::<S, N>))
        .route(
            "/api/items/:id",
            get(get_item::<S, N>)
                .put(update_item::<S, N>)
                .delete(delete_item::<S, N>),
        )
        .route("/health", get(health::<S, N>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchRequest {
    #[serde(default)]
    pub name: Option<String>,
}

impl SearchRequest {
    /// The requested name, `None` when missing or blank.
    pub(super) fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

async fn list_items<S: PrimaryStore, N: ItemEventSink>(
    State(service): State<Shared<S, N>>,
) -> Response {
    match service.list() {
        Ok(items) => {
            let count = items.len();
            ApiResponse::ok(items).count(count).with_status(200)
        }
        Err(err) => item_error(err, "Error fetching items"),
    }
}

async fn get_item<S: PrimaryStore, N: ItemEventSink>(
    State(service): State<Shared<S, N>>,
    Path(id): Path<String>,
) -> Response {
    match service.get(&id) {
        Ok(item) => ApiResponse::ok(item).with_status(200),
        Err(err) => item_error(err, "Error fetching item"),
    }
}

async fn search_item<S: PrimaryStore, N: ItemEventSink>(
    State(service): State<Shared<S, N>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return ApiResponse::rejection(&rejection).with_status(400),
    };
    let Some(name) = request.name() else {
        return ApiResponse::failure("Name field is required in request body").with_status(400);
    };

    match service.find_by_name(name) {
        Ok(item) => ApiResponse::ok(item).with_status(200),
        Err(err) => item_error(err, "Error searching item by name"),
    }
}

async fn create_item<S: PrimaryStore, N: ItemEventSink>(
    State(service): State<Shared<S, N>>,
    body: Result<Json<NewItem>, JsonRejection>,
) -> Response {
    let input = match body {
        Ok(Json(input)) => input,
        Err(rejection) => return ApiResponse::rejection(&rejection).with_status(400),
    };

    match service.create(input) {
        Ok(mutation) => ApiResponse::ok(mutation.item)
            .message("Item created successfully")
            .with_status(201),
        Err(err) => item_error(err, "Error creating item"),
    }
}

async fn update_item<S: PrimaryStore, N: ItemEventSink>(
    State(service): State<Shared<S, N>>,
    Path(id): Path<String>,
    body: Result<Json<ItemPatch>, JsonRejection>,
) -> Response {
    let patch = match body {
        Ok(Json(patch)) => patch,
        Err(rejection) => return ApiResponse::rejection(&rejection).with_status(400),
    };

    match service.update(&id, patch) {
        Ok(mutation) => ApiResponse::ok(mutation.item)
            .message("Item updated successfully")
            .with_status(200),
        Err(err) => item_error(err, "Error updating item"),
    }
}

async fn delete_item<S: PrimaryStore, N: ItemEventSink>(
    State(service): State<Shared<S, N>>,
    Path(id): Path<String>,
) -> Response {
    match service.delete(&id) {
        Ok(_) => ApiResponse {
            success: true,
            message: Some("Item deleted successfully".into()),
            ..ApiResponse::default()
        }
        .with_status(200),
        Err(err) => item_error(err, "Error deleting item"),
    }
}

async fn health<S: PrimaryStore, N: ItemEventSink>(
    State(service): State<Shared<S, N>>,
) -> Response {
    let database = service.store().ping();
    let broker = service.events().is_ready();
    let healthy = database.is_ok() && broker;

    let body = json!({
        "status": if healthy { "ok" } else { "degraded" },
        "service": "primary",
        "timestamp": now_timestamp(),
        "checks": {
            "database": match &database {
                Ok(()) => "ok".to_string(),
                Err(err) => err.to_string(),
            },
            "broker": if broker { "connected" } else { "disconnected" },
        },
    });
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

fn item_error(err: ItemError, context: &str) -> Response {
    let status = err.status_code();
    match &err {
        ItemError::Validation(validation) => ApiResponse::validation(validation).with_status(status),
        ItemError::NotFound(_) => ApiResponse::failure(err.to_string()).with_status(status),
        ItemError::Store(store) => {
            error!(error = %store, "{}", context);
            ApiResponse::failure(context)
                .error(store.to_string())
                .with_status(status)
        }
    }
}
