//! # HTTP Publisher
//!
//! Posts announcements to a JSON API with a bearer token:
//!
//! ```text
//! POST {endpoint}
//! Authorization: Bearer {token}
//! {"text": "Liquidated short on XBTUSD: ..."}
//! ```

use crate::infrastructure::publisher::traits::{
    DAILY_LIMIT_TEXT, PublishError, PublishResult, Publisher,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct PostBody<'a> {
    text: &'a str,
}

/// Publisher backed by an HTTP posting API.
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: Client,
    endpoint: String,
    bearer_token: String,
}

impl HttpPublisher {
    /// Creates a publisher posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::Network` if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        bearer_token: impl Into<String>,
        timeout_ms: u64,
    ) -> PublishResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PublishError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            bearer_token: bearer_token.into(),
        })
    }

    /// Target endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn map_reqwest_error(error: &reqwest::Error) -> PublishError {
        if error.is_timeout() {
            PublishError::network("request timed out")
        } else if error.is_connect() {
            PublishError::network(format!("connection failed: {error}"))
        } else {
            PublishError::network(format!("HTTP request failed: {error}"))
        }
    }

    fn map_status_error(status: StatusCode, body: String) -> PublishError {
        if body.to_lowercase().contains(DAILY_LIMIT_TEXT) {
            return PublishError::posting_limit_exceeded(body);
        }

        match status {
            StatusCode::TOO_MANY_REQUESTS => PublishError::rate_limited(body),
            StatusCode::UNAUTHORIZED => PublishError::authentication(body),
            _ => PublishError::rejected(status.as_u16(), body),
        }
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, text: &str) -> PublishResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.bearer_token)
            .json(&PostBody { text })
            .send()
            .await
            .map_err(|e| Self::map_reqwest_error(&e))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "published");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Self::map_status_error(status, body))
    }
}
