use async_trait::async_trait;
use thiserror::Error;

use crate::event::ItemFields;

/// Failure to reach or understand the primary store's API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("primary API returned status {0}")]
    Status(u16),
    #[error("primary API request failed: {0}")]
    Transport(String),
    #[error("primary API response could not be decoded: {0}")]
    Decode(String),
}

/// Read access to the primary store's by-name search capability.
#[async_trait]
pub trait PrimaryItemSource: Send + Sync {
    /// The primary's record for `name`, or `None` when it has none.
    async fn search_by_name(&self, name: &str) -> Result<Option<ItemFields>, UpstreamError>;

    /// Whether the primary API is reachable.
    async fn health(&self) -> Result<(), UpstreamError>;
}

#[cfg(feature = "http")]
pub use client::HttpPrimaryClient;

#[cfg(feature = "http")]
mod client {
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::{Client, StatusCode};
    use serde::{Deserialize, Serialize};

    use super::{PrimaryItemSource, UpstreamError};
    use crate::event::ItemFields;

    const SEARCH_PATH: &str = "/api/items/search";
    const HEALTH_PATH: &str = "/health";

    /// reqwest client for the primary API.
    #[derive(Debug, Clone)]
    pub struct HttpPrimaryClient {
        client: Client,
        base_url: String,
    }

    #[derive(Serialize)]
    struct SearchRequest<'a> {
        name: &'a str,
    }

    #[derive(Deserialize)]
    struct SearchResponse {
        #[serde(default)]
        success: bool,
        #[serde(default)]
        data: Option<ItemFields>,
    }

    impl HttpPrimaryClient {
        /// Every request, health checks included, is bounded by `timeout`.
        pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|err| UpstreamError::Transport(format!("http client build failed: {err}")))?;
            Ok(Self {
                client,
                base_url: base_url.into(),
            })
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base_url.trim_end_matches('/'), path)
        }
    }

    #[async_trait]
    impl PrimaryItemSource for HttpPrimaryClient {
        async fn search_by_name(&self, name: &str) -> Result<Option<ItemFields>, UpstreamError> {
            let response = self
                .client
                .post(self.url(SEARCH_PATH))
                .json(&SearchRequest { name })
                .send()
                .await
                .map_err(|err| UpstreamError::Transport(err.to_string()))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(UpstreamError::Status(status.as_u16()));
            }

            let body: SearchResponse = response
                .json()
                .await
                .map_err(|err| UpstreamError::Decode(err.to_string()))?;
            Ok(body.data.filter(|_| body.success))
        }

        async fn health(&self) -> Result<(), UpstreamError> {
            let response = self
                .client
                .get(self.url(HEALTH_PATH))
                .send()
                .await
                .map_err(|err| UpstreamError::Transport(err.to_string()))?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(UpstreamError::Status(response.status().as_u16()))
            }
        }
    }

}
