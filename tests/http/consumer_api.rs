//! Consumer service over HTTP, verifying against a live primary API.

use serde_json::{json, Value};

use crate::support::{ConsumerServer, PrimaryServer};

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

async fn create(primary: &PrimaryServer, body: Value) -> String {
    let (status, created) = post(&primary.base, "/api/items", body).await;
    assert_eq!(status, 201);
    created["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test(flavor = "multi_thread")]
async fn replicated_item_verifies() {
    let primary = PrimaryServer::start().await;
    let consumer = ConsumerServer::start(&primary.broker, &primary.base).await;

    let id = create(&primary, json!({ "name": "Widget", "price": 9.99, "quantity": 5 })).await;
    consumer.wait_for_rows(1).await;

    let (status, body) = post(&consumer.base, "/api/items/search", json!({ "name": "Widget" })).await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Item found and fields match");
    assert_eq!(body["data"]["originalItemId"], id.as_str());
    assert!(body["data"]["lastSyncedAt"].is_string());

    let stats = consumer.handle.stop();
    assert_eq!(stats.applied, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn stale_replica_is_reported_as_mismatch() {
    let primary = PrimaryServer::start().await;
    let consumer = ConsumerServer::start(&primary.broker, &primary.base).await;

    let id = create(&primary, json!({ "name": "Widget", "price": 9.99, "quantity": 5 })).await;
    consumer.wait_for_rows(1).await;

    // the update commits but its event is lost
    primary.broker.fail_publishes("broker unreachable");
    let resp = reqwest::Client::new()
        .put(format!("{}/api/items/{id}", primary.base))
        .json(&json!({ "price": 10.99 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let (status, body) = post(&consumer.base, "/api/items/search", json!({ "name": "Widget" })).await;

    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "fields do not match");
    assert_eq!(body["details"]["replica"]["price"], 9.99);
    assert_eq!(body["details"]["primary"]["price"], 10.99);
    assert_eq!(body["details"]["differingFields"], json!(["price"]));
}

#[tokio::test(flavor = "multi_thread")]
async fn ghost_is_404_not_in_replica() {
    let primary = PrimaryServer::start().await;
    let consumer = ConsumerServer::start(&primary.broker, &primary.base).await;

    let (status, body) = post(&consumer.base, "/api/items/search", json!({ "name": "Ghost" })).await;

    assert_eq!(status, 404);
    assert_eq!(body["message"], "not found in replica");
    assert!(body.get("details").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn deleted_on_primary_only_is_404_not_in_primary() {
    let primary = PrimaryServer::start().await;
    let consumer = ConsumerServer::start(&primary.broker, &primary.base).await;

    let id = create(&primary, json!({ "name": "Widget" })).await;
    consumer.wait_for_rows(1).await;
    primary.broker.fail_publishes("broker unreachable");
    primary.service.delete(&id).unwrap();

    let (status, body) = post(&consumer.base, "/api/items/search", json!({ "name": "Widget" })).await;

    assert_eq!(status, 404);
    assert_eq!(body["message"], "not found in primary");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_primary_is_500() {
    let primary = PrimaryServer::start().await;
    // port 1 on loopback refuses connections
    let consumer = ConsumerServer::start(&primary.broker, "http://127.0.0.1:1").await;

    create(&primary, json!({ "name": "Widget" })).await;
    consumer.wait_for_rows(1).await;

    let (status, body) = post(&consumer.base, "/api/items/search", json!({ "name": "Widget" })).await;

    assert_eq!(status, 500);
    assert_eq!(body["success"], false);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("primary store unavailable"));

    let resp = reqwest::get(format!("{}/health", consumer.base)).await.unwrap();
    assert_eq!(resp.status(), 503);
    let health: Value = resp.json().await.unwrap();
    assert_eq!(health["checks"]["database"], "ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_name_is_400() {
    let primary = PrimaryServer::start().await;
    let consumer = ConsumerServer::start(&primary.broker, &primary.base).await;

    let (status, body) = post(&consumer.base, "/api/items/search", json!({ "name": "  " })).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Validation error");

    let resp = reqwest::get(format!("{}/health", consumer.base)).await.unwrap();
    assert_eq!(resp.status(), 200);
}
