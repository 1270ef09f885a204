//! # Feed Errors
//!
//! Failures that end a feed session. Each one is followed by a reconnect.

use thiserror::Error;

/// Error type for feed sessions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The connection could not be established or broke.
    #[error("connection error: {0}")]
    Connection(String),

    /// The connection went silent or sent an unusable frame.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The exchange reported an error.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The peer closed the connection, or the downstream pipeline is gone.
    #[error("feed closed")]
    Closed,
}

impl FeedError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Creates an upstream error.
    #[must_use]
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Returns true if the session ended because something closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;
