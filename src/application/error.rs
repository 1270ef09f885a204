//! # Application Errors
//!
//! Error type for the application layer.
//!
//! Almost nothing in the running pipeline is fatal: unknown instruments,
//! failed saves and failed posts are logged and skipped. What remains are
//! startup failures, which bubble up to the binary through this type.
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Domain(DomainError)          - Valuation and combining rules
//! ├── Repository(RepositoryError)  - High score storage
//! ├── Publish(PublishError)        - Outbound posting
//! ├── Feed(FeedError)              - Exchange feed
//! ├── Asset(AssetError)            - Text decks
//! ├── Config(ConfigError)          - Configuration
//! └── Internal(String)             - Task failures
//! ```

use crate::config::ConfigError;
use crate::domain::errors::DomainError;
use crate::infrastructure::assets::AssetError;
use crate::infrastructure::feed::FeedError;
use crate::infrastructure::persistence::RepositoryError;
use crate::infrastructure::publisher::PublishError;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain rule violation.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// High score storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Posting failure.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Feed failure.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Text deck failure.
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A pipeline task failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a startup configuration problem.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Asset(_))
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Symbol;

    #[test]
    fn conversions_keep_the_source_message() {
        let err: ApplicationError = DomainError::InstrumentNotFound(Symbol::new("XBTUSD")).into();
        assert!(err.to_string().contains("XBTUSD"));
        assert!(!err.is_config());

        let err: ApplicationError = ConfigError::invalid("burst must be positive").into();
        assert!(err.is_config());
        assert!(err.to_string().contains("burst"));
    }

    #[test]
    fn internal_errors() {
        let err = ApplicationError::internal("dispatcher panicked");
        assert_eq!(err.to_string(), "internal error: dispatcher panicked");
    }
}
