//! HTTP transport for both services.
//!
//! Requires the `http` feature. Uses axum for routing; every body, success
//! or failure, is an [`ApiResponse`] envelope except the health checks.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use itemsync::http;
//!
//! let app = http::primary_router(Arc::new(service));
//! http::serve(app, "0.0.0.0:3000", shutdown_signal()).await?;
//! ```

mod consumer;
mod primary;
mod response;

use std::future::Future;

use axum::Router;
use tokio::net::{TcpListener, ToSocketAddrs};
use tracing::info;

pub use consumer::consumer_router;
pub use primary::primary_router;
pub use response::ApiResponse;

/// Serve `app` at `addr` until `shutdown` resolves, then finish in-flight requests.
pub async fn serve<A, F>(app: Router, addr: A, shutdown: F) -> Result<(), std::io::Error>
where
    A: ToSocketAddrs,
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "http server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
