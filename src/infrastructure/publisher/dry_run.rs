//! # Dry-Run Publisher
//!
//! Logs announcements instead of posting them.

use crate::infrastructure::publisher::traits::{PublishResult, Publisher};
use async_trait::async_trait;
use tracing::info;

/// Publisher that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunPublisher;

impl DryRunPublisher {
    /// Creates a dry-run publisher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, text: &str) -> PublishResult<()> {
        info!(text, "would have published");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_succeeds() {
        DryRunPublisher::new().publish("hello").await.unwrap();
    }
}
