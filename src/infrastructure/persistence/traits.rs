//! # Repository Traits
//!
//! Port definitions for persistence abstraction.
//!
//! # Available Repositories
//!
//! - [`HighScoreRepository`]: Durable storage of the per-symbol
//!   [`HighScores`] document
//!
//! # Examples
//!
//! ```ignore
//! use liquidation_herald::infrastructure::persistence::traits::HighScoreRepository;
//!
//! async fn warm_start(repo: &impl HighScoreRepository) {
//!     let scores = repo.load().await?;
//!     println!("Tracking {} symbols", scores.scores.len());
//! }
//! ```

use crate::domain::services::HighScores;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Storage I/O failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates an I/O error.
    #[must_use]
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is an I/O error.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository for the high score document.
///
/// The whole document is read once at startup and rewritten after every
/// decoration.
#[async_trait]
pub trait HighScoreRepository: Send + Sync + fmt::Debug {
    /// Loads the stored high scores.
    ///
    /// A store that was never written yields empty high scores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Serialization` if the stored document is
    /// corrupt, or `RepositoryError::Io` if it cannot be read.
    async fn load(&self) -> RepositoryResult<HighScores>;

    /// Replaces the stored high scores.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the document cannot be written.
    async fn save(&self, scores: &HighScores) -> RepositoryResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let err: RepositoryError = std::io::Error::other("disk full").into();
        assert!(err.is_io());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn json_errors_convert() {
        let err: RepositoryError = serde_json::from_str::<HighScores>("{")
            .map(|_| ())
            .map_err(RepositoryError::from)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Serialization(_)));
    }
}
