//! Runs the primary API and the consumer service in one process, joined by
//! an in-memory broker.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use itemsync::http::{self, consumer_router, primary_router};
use itemsync::telemetry::{init_logging, LogFormat};
use itemsync::{
    Config, ConsumerLoop, HttpPrimaryClient, InMemoryBroker, InMemoryItemStore,
    InMemoryReplicaStore, ItemEventPublisher, ItemService, ReplicaProjector, VerifyItem,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    init_logging(LogFormat::from_env())?;
    let config = Config::from_env()?;
    info!(
        broker = %config.broker.address,
        topic = %config.broker.topic,
        partitions = config.broker.partitions,
        "starting itemsync"
    );

    let broker = InMemoryBroker::new(config.broker.partitions);

    // primary side
    let publisher = ItemEventPublisher::new(broker.producer(), config.broker.topic.clone());
    publisher.connect()?;
    info!(client_id = %config.primary.client_id, "event publisher ready");
    let primary = Arc::new(ItemService::new(InMemoryItemStore::new(), publisher));

    // consumer side
    let replica = InMemoryReplicaStore::new();
    let consumer = ConsumerLoop::new(
        broker.consumer(config.consumer.group_id.clone(), config.broker.topic.clone()),
        ReplicaProjector::new(replica.clone()),
    )
    .spawn(config.consumer.poll_interval)?;

    let client = HttpPrimaryClient::new(
        config.consumer.primary_api_url.clone(),
        config.consumer.primary_api_timeout,
    )?;
    let verify = Arc::new(VerifyItem::new(replica, client));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let primary_server = async {
        let result = http::serve(
            primary_router(primary.clone()),
            ("0.0.0.0", config.primary.port),
            wait_for_shutdown(shutdown_rx.clone()),
        )
        .await;
        let _ = shutdown_tx.send(true);
        result
    };
    let consumer_server = async {
        let result = http::serve(
            consumer_router(verify),
            ("0.0.0.0", config.consumer.port),
            wait_for_shutdown(shutdown_rx.clone()),
        )
        .await;
        let _ = shutdown_tx.send(true);
        result
    };
    let signals = async {
        tokio::select! {
            _ = shutdown_signal() => info!("shutdown signal received, draining"),
            _ = wait_for_shutdown(shutdown_rx.clone()) => {}
        }
        let _ = shutdown_tx.send(true);
    };

    let (primary_result, consumer_result, ()) =
        tokio::join!(primary_server, consumer_server, signals);

    let stats = tokio::task::spawn_blocking(move || consumer.stop()).await?;
    info!(
        applied = stats.applied,
        skipped = stats.skipped,
        failed = stats.failed,
        "consumer drained"
    );

    if let Err(err) = primary.events().disconnect() {
        warn!(error = %err, "producer disconnect failed");
    }

    for (service, result) in [("primary", primary_result), ("consumer", consumer_result)] {
        if let Err(err) = result {
            error!(service, error = %err, "http server failed");
            return Err(err.into());
        }
    }

    info!("itemsync stopped");
    Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
