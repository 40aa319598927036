//! Verification against an in-process primary.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use itemsync::{
    InMemoryReplicaStore, ItemError, ItemEvent, ItemFields, ItemPatch, NewItem, PrimaryItemSource,
    UpstreamError, Verification, VerifyItem,
};

use crate::support::{Pipeline, Primary, TS};

/// Reads the primary service directly and counts searches.
struct InProcessPrimary {
    service: Arc<Primary>,
    searches: AtomicUsize,
}

#[async_trait]
impl PrimaryItemSource for InProcessPrimary {
    async fn search_by_name(&self, name: &str) -> Result<Option<ItemFields>, UpstreamError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        match self.service.find_by_name(name) {
            Ok(item) => Ok(Some(item.fields())),
            Err(ItemError::NotFound(_)) => Ok(None),
            Err(err) => Err(UpstreamError::Transport(err.to_string())),
        }
    }

    async fn health(&self) -> Result<(), UpstreamError> {
        Ok(())
    }
}

fn verifier(pipeline: &Pipeline) -> VerifyItem<InMemoryReplicaStore, InProcessPrimary> {
    VerifyItem::new(
        pipeline.replica.clone(),
        InProcessPrimary {
            service: pipeline.primary.clone(),
            searches: AtomicUsize::new(0),
        },
    )
}

fn create_widget(pipeline: &Pipeline) -> String {
    pipeline
        .primary
        .create(NewItem::named("Widget").with_price(9.99).with_quantity(5))
        .unwrap()
        .item
        .id
}

#[tokio::test]
async fn replicated_item_matches() {
    let pipeline = Pipeline::new();
    let id = create_widget(&pipeline);
    pipeline.sync();

    let result = verifier(&pipeline).verify_by_name("Widget").await;

    match result {
        Verification::Match(row) => assert_eq!(row.original_item_id, id),
        other => panic!("expected match, got {other:?}"),
    }
}

#[tokio::test]
async fn unreplicated_update_is_a_mismatch() {
    let pipeline = Pipeline::new();
    let id = create_widget(&pipeline);
    pipeline.sync();

    // primary moves on while the consumer is behind
    pipeline
        .primary
        .update(
            &id,
            ItemPatch {
                price: Some(10.99),
                ..ItemPatch::default()
            },
        )
        .unwrap();

    let verify = verifier(&pipeline);
    let result = verify.verify_by_name("Widget").await;

    assert_eq!(result.reason().as_deref(), Some("fields do not match"));
    assert_eq!(result.status_code(), 404);
    let details = result.details().unwrap();
    assert_eq!(details.replica.price, Some(9.99));
    assert_eq!(details.primary.price, Some(10.99));
    assert_eq!(details.differing_fields, vec!["price"]);

    // once the consumer catches up the stores agree again
    pipeline.sync();
    assert!(verify.verify_by_name("Widget").await.is_success());
}

#[tokio::test]
async fn ghost_is_not_in_replica_and_primary_is_not_asked() {
    let pipeline = Pipeline::new();
    let verify = verifier(&pipeline);

    let result = verify.verify_by_name("Ghost").await;

    assert_eq!(result, Verification::NotInReplica);
    assert_eq!(result.reason().as_deref(), Some("not found in replica"));
    assert_eq!(verify.primary().searches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn deleted_on_primary_before_replication() {
    let pipeline = Pipeline::new();
    let id = create_widget(&pipeline);
    pipeline.sync();
    pipeline.primary.delete(&id).unwrap();

    let result = verifier(&pipeline).verify_by_name("Widget").await;
    assert_eq!(result, Verification::NotInPrimary);
}

#[tokio::test]
async fn blank_description_matches_absent_one() {
    let pipeline = Pipeline::new();
    pipeline.broker.fail_publishes("offline");
    let id = pipeline
        .primary
        .create(NewItem::named("Widget").with_description("   "))
        .unwrap()
        .item
        .id;
    pipeline.broker.restore_publishes();

    // replica learns of the item from an event without a description
    pipeline.publish(&ItemEvent::created(id.as_str(), ItemFields::named("Widget")).at(TS));
    pipeline.sync();

    let result = verifier(&pipeline).verify_by_name("Widget").await;
    assert!(result.is_success(), "{result:?}");
}
