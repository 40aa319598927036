//! Server fixtures.

use std::sync::Arc;
use std::time::Duration;

use itemsync::bus::InMemoryProducer;
use itemsync::http::{consumer_router, primary_router};
use itemsync::{
    ConsumerHandle, ConsumerLoop, HttpPrimaryClient, InMemoryBroker, InMemoryItemStore,
    InMemoryReplicaStore, ItemEventPublisher, ItemService, ReplicaProjector, VerifyItem,
};

pub const TOPIC: &str = "item-events";

pub type Primary = ItemService<InMemoryItemStore, ItemEventPublisher<InMemoryProducer>>;

/// Bind to port 0 and return the base URL.
async fn start(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A primary API server backed by in-memory stores.
pub struct PrimaryServer {
    pub base: String,
    pub broker: InMemoryBroker,
    pub service: Arc<Primary>,
}

impl PrimaryServer {
    pub async fn start() -> Self {
        let broker = InMemoryBroker::new(3);
        let publisher = ItemEventPublisher::new(broker.producer(), TOPIC);
        publisher.connect().unwrap();
        let service = Arc::new(ItemService::new(InMemoryItemStore::new(), publisher));
        let base = start(primary_router(service.clone())).await;
        Self {
            base,
            broker,
            service,
        }
    }
}

/// A consumer service reading `broker` and verifying against `primary_base`.
pub struct ConsumerServer {
    pub base: String,
    pub replica: InMemoryReplicaStore,
    pub handle: ConsumerHandle,
}

impl ConsumerServer {
    pub async fn start(broker: &InMemoryBroker, primary_base: &str) -> Self {
        let replica = InMemoryReplicaStore::new();
        let handle = ConsumerLoop::new(
            broker.consumer("consumer-tests", TOPIC),
            ReplicaProjector::new(replica.clone()),
        )
        .spawn(Duration::from_millis(10))
        .unwrap();

        let client = HttpPrimaryClient::new(primary_base, Duration::from_secs(2)).unwrap();
        let verify = Arc::new(VerifyItem::new(replica.clone(), client));
        let base = start(consumer_router(verify)).await;
        Self {
            base,
            replica,
            handle,
        }
    }

    /// Wait until the replica holds `count` rows.
    pub async fn wait_for_rows(&self, count: usize) {
        for _ in 0..200 {
            if self.replica.len() == count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("replica never reached {count} rows, has {}", self.replica.len());
    }
}
