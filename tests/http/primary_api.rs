//! Primary API over HTTP.

use serde_json::{json, Value};

use crate::support::{PrimaryServer, TOPIC};

async fn post(base: &str, path: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn get(base: &str, path: &str) -> (u16, Value) {
    let resp = reqwest::get(format!("{base}{path}")).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn create_returns_201_and_publishes() {
    let server = PrimaryServer::start().await;

    let (status, body) = post(
        &server.base,
        "/api/items",
        json!({ "name": "Widget", "price": 9.99, "quantity": 5 }),
    )
    .await;

    assert_eq!(status, 201);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Item created successfully");
    assert_eq!(body["data"]["name"], "Widget");
    assert!(body["data"]["id"].is_string());
    assert!(body["data"]["createdAt"].is_string());
    assert_eq!(server.broker.len(TOPIC), 1);
}

#[tokio::test]
async fn create_returns_201_when_broker_is_down() {
    let server = PrimaryServer::start().await;
    server.broker.fail_publishes("broker unreachable");

    let (status, body) = post(&server.base, "/api/items", json!({ "name": "Widget" })).await;

    assert_eq!(status, 201);
    assert_eq!(body["success"], true);
    assert!(server.broker.is_empty(TOPIC));

    let (status, list) = get(&server.base, "/api/items").await;
    assert_eq!(status, 200);
    assert_eq!(list["count"], 1);
}

#[tokio::test]
async fn invalid_item_is_400_and_not_stored() {
    let server = PrimaryServer::start().await;

    let (status, body) = post(
        &server.base,
        "/api/items",
        json!({ "name": "", "price": -1, "quantity": 2 }),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "price"]);
    assert!(server.service.store().is_empty());
    assert!(server.broker.is_empty(TOPIC));
}

#[tokio::test]
async fn malformed_json_is_400_envelope() {
    let server = PrimaryServer::start().await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/items", server.base))
        .header("content-type", "application/json")
        .body("{\"name\":")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn get_update_delete_lifecycle() {
    let server = PrimaryServer::start().await;
    let client = reqwest::Client::new();

    let (_, created) = post(&server.base, "/api/items", json!({ "name": "Widget" })).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, fetched) = get(&server.base, &format!("/api/items/{id}")).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["data"]["id"], id.as_str());

    let resp = client
        .put(format!("{}/api/items/{id}", server.base))
        .json(&json!({ "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let updated: Value = resp.json().await.unwrap();
    assert_eq!(updated["message"], "Item updated successfully");
    assert_eq!(updated["data"]["quantity"], 3);
    assert_eq!(updated["data"]["name"], "Widget");

    let resp = client
        .delete(format!("{}/api/items/{id}", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, body) = get(&server.base, &format!("/api/items/{id}")).await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Item not found");

    // created, updated, deleted
    assert_eq!(server.broker.len(TOPIC), 3);
}

#[tokio::test]
async fn update_and_delete_unknown_id_are_404() {
    let server = PrimaryServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .put(format!("{}/api/items/missing", server.base))
        .json(&json!({ "price": 1.5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .delete(format!("{}/api/items/missing", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert!(server.broker.is_empty(TOPIC));
}

#[tokio::test]
async fn search_by_name() {
    let server = PrimaryServer::start().await;
    post(&server.base, "/api/items", json!({ "name": "Widget", "price": 9.99 })).await;

    let (status, body) = post(&server.base, "/api/items/search", json!({ "name": "Widget" })).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["price"], 9.99);

    let (status, _) = post(&server.base, "/api/items/search", json!({ "name": "Ghost" })).await;
    assert_eq!(status, 404);

    let (status, body) = post(&server.base, "/api/items/search", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn health_reports_broker_state() {
    let server = PrimaryServer::start().await;

    let (status, body) = get(&server.base, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["broker"], "connected");

    server.service.events().disconnect().unwrap();

    let (status, body) = get(&server.base, "/health").await;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["database"], "ok");
}
