//! State machine scenarios, end to end through the broker.

use itemsync::{Applied, ItemEvent, ItemFields, ItemPatch, MessageOutcome, NewItem, ReplicaStore};

use crate::support::{Pipeline, TS};

fn widget() -> ItemFields {
    ItemFields::named("Widget").with_price(9.99).with_quantity(5)
}

#[test]
fn created_event_adds_replica_row() {
    let pipeline = Pipeline::new();
    pipeline.publish_raw(
        "A1",
        r#"{"eventType":"ITEM_CREATED","itemId":"A1","data":{"name":"Widget","price":9.99,"quantity":5},"timestamp":"2024-01-01T00:00:00Z"}"#,
    );

    let outcomes = pipeline.sync();
    assert_eq!(
        outcomes,
        vec![MessageOutcome::Applied(Applied::Upserted { inserted: true })]
    );

    let row = pipeline.replica.find_by_original_id("A1").unwrap().unwrap();
    assert_eq!(row.name, "Widget");
    assert_eq!(row.price, Some(9.99));
    assert_eq!(row.quantity, Some(5));
    assert_eq!(row.description, None);
}

#[test]
fn redelivered_created_is_idempotent() {
    let pipeline = Pipeline::new();
    let event = ItemEvent::created("A1", widget()).at(TS);
    pipeline.publish(&event);
    pipeline.publish(&event);

    pipeline.sync();

    let rows = pipeline.replica.all();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].fields(), widget());
}

#[test]
fn updated_before_created_converges() {
    let pipeline = Pipeline::new();
    let newer = ItemFields::named("Widget").with_price(10.99).with_quantity(5);
    pipeline.publish(&ItemEvent::updated("A1", newer.clone()).at(TS));

    pipeline.sync();

    let row = pipeline.replica.find_by_original_id("A1").unwrap().unwrap();
    assert_eq!(row.fields(), newer);
    assert_eq!(pipeline.replica.len(), 1);
}

#[test]
fn deleted_after_created_removes_row() {
    let pipeline = Pipeline::new();
    pipeline.publish(&ItemEvent::created("A1", widget()).at(TS));
    pipeline.publish(&ItemEvent::deleted("A1").at(TS));

    let outcomes = pipeline.sync();

    assert_eq!(outcomes.last(), Some(&MessageOutcome::Applied(Applied::Deleted)));
    assert!(pipeline.replica.find_by_original_id("A1").unwrap().is_none());
}

#[test]
fn deleted_when_absent_is_noop() {
    let pipeline = Pipeline::new();
    pipeline.publish(&ItemEvent::deleted("A1").at(TS));

    assert_eq!(
        pipeline.sync(),
        vec![MessageOutcome::Applied(Applied::AlreadyAbsent)]
    );
    assert!(pipeline.replica.is_empty());
}

#[test]
fn primary_mutations_replicate_in_order() {
    let pipeline = Pipeline::new();

    let created = pipeline
        .primary
        .create(NewItem::named("Widget").with_price(9.99).with_quantity(5))
        .unwrap();
    assert!(created.notified.is_published());
    let id = created.item.id;

    pipeline
        .primary
        .update(
            &id,
            ItemPatch {
                quantity: Some(4),
                ..ItemPatch::default()
            },
        )
        .unwrap();
    pipeline.sync();

    let row = pipeline.replica.find_by_original_id(&id).unwrap().unwrap();
    assert_eq!(row.quantity, Some(4));
    assert_eq!(row.fields(), pipeline.primary.get(&id).unwrap().fields());

    pipeline.primary.delete(&id).unwrap();
    pipeline.sync();
    assert!(pipeline.replica.is_empty());
}

#[test]
fn many_items_each_keep_their_own_order() {
    let pipeline = Pipeline::new();
    for n in 0..10 {
        let id = format!("item-{n}");
        let thing = ItemFields::named("Thing");
        pipeline.publish(&ItemEvent::created(id.as_str(), thing.clone().with_quantity(0)).at(TS));
        pipeline.publish(&ItemEvent::updated(id.as_str(), thing.with_quantity(n)).at(TS));
    }

    pipeline.sync();

    assert_eq!(pipeline.replica.len(), 10);
    for n in 0..10 {
        let row = pipeline
            .replica
            .find_by_original_id(&format!("item-{n}"))
            .unwrap()
            .unwrap();
        assert_eq!(row.quantity, Some(n));
    }
}
