//! Shared fixtures for replication tests.

use std::sync::Arc;
use std::time::Duration;

use itemsync::bus::{Connection, InMemoryConsumer, InMemoryProducer, Message, Publisher};
use itemsync::event::codec;
use itemsync::{
    ConsumerLoop, InMemoryBroker, InMemoryItemStore, InMemoryReplicaStore, ItemEvent,
    ItemEventPublisher, ItemService, MessageOutcome, ReplicaProjector,
};

pub const TOPIC: &str = "item-events";
pub const GROUP: &str = "my-tiny-app-consumer-group";
pub const TS: &str = "2024-01-01T00:00:00Z";

const DRAIN_WAIT: Duration = Duration::from_millis(20);

pub type Primary = ItemService<InMemoryItemStore, ItemEventPublisher<InMemoryProducer>>;

/// Primary service, broker and consumer wired together.
pub struct Pipeline {
    pub broker: InMemoryBroker,
    pub primary: Arc<Primary>,
    pub replica: InMemoryReplicaStore,
    pub consumer: ConsumerLoop<InMemoryConsumer, InMemoryReplicaStore>,
}

impl Pipeline {
    pub fn new() -> Self {
        let broker = InMemoryBroker::new(3);

        let publisher = ItemEventPublisher::new(broker.producer(), TOPIC);
        publisher.connect().unwrap();
        let primary = Arc::new(ItemService::new(InMemoryItemStore::new(), publisher));

        let replica = InMemoryReplicaStore::new();
        let subscriber = broker.consumer(GROUP, TOPIC);
        subscriber.connect().unwrap();
        let consumer = ConsumerLoop::new(subscriber, ReplicaProjector::new(replica.clone()));

        Self {
            broker,
            primary,
            replica,
            consumer,
        }
    }

    /// Publish a hand-built event straight to the topic.
    pub fn publish(&self, event: &ItemEvent) {
        self.publish_raw(event.item_id(), codec::encode(event).unwrap());
    }

    pub fn publish_raw(&self, key: &str, payload: impl Into<Vec<u8>>) {
        let producer = self.broker.producer();
        producer.connect().unwrap();
        producer
            .publish(Message::new("test", TOPIC, payload.into()).with_key(key))
            .unwrap();
    }

    /// Consume everything currently on the topic.
    pub fn sync(&self) -> Vec<MessageOutcome> {
        self.consumer.drain(DRAIN_WAIT).unwrap()
    }
}
