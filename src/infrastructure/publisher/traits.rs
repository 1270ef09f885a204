//! # Publisher Port
//!
//! Outbound boundary: one decorated text per notification, handed to an
//! external posting API.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Text the posting API returns once the daily posting allowance is spent.
pub const DAILY_LIMIT_TEXT: &str = "daily status update limit";

/// Error type for publish operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    /// The account's daily posting allowance is exhausted.
    #[error("posting limit exceeded: {0}")]
    PostingLimitExceeded(String),

    /// The API throttled the request.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The request never completed.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with an error status.
    #[error("rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
}

impl PublishError {
    /// Creates a posting limit error.
    #[must_use]
    pub fn posting_limit_exceeded(msg: impl Into<String>) -> Self {
        Self::PostingLimitExceeded(msg.into())
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Creates a rejected error.
    #[must_use]
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Returns true if publishing should pause before the next attempt.
    #[must_use]
    pub fn is_posting_limit(&self) -> bool {
        matches!(self, Self::PostingLimitExceeded(_) | Self::RateLimited(_))
    }
}

/// Result type for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Sink for decorated announcements.
#[async_trait]
pub trait Publisher: Send + Sync + fmt::Debug {
    /// Publishes one announcement.
    ///
    /// # Errors
    ///
    /// Returns a [`PublishError`] describing why the post was not made;
    /// [`PublishError::is_posting_limit`] signals that the caller should
    /// back off.
    async fn publish(&self, text: &str) -> PublishResult<()>;
}
