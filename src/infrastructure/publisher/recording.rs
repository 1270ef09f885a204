//! # Recording Publisher
//!
//! In-memory [`Publisher`] that keeps every published text, for tests and
//! local runs.

use crate::infrastructure::publisher::traits::{PublishError, PublishResult, Publisher};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Publisher that records texts in memory.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<String>>>,
    failures: Arc<Mutex<VecDeque<PublishError>>>,
}

impl RecordingPublisher {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next publish call fail with `error`.
    ///
    /// Queued failures are consumed in order.
    pub fn fail_next(&self, error: PublishError) {
        self.failures.lock().push_back(error);
    }

    /// Texts published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<String> {
        self.published.lock().clone()
    }

    /// Number of texts published so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.published.lock().len()
    }

    /// Returns true if nothing has been published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.published.lock().is_empty()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, text: &str) -> PublishResult<()> {
        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }
        self.published.lock().push(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_in_order() {
        let publisher = RecordingPublisher::new();
        let shared = publisher.clone();
        publisher.publish("first").await.unwrap();
        publisher.publish("second").await.unwrap();

        assert_eq!(shared.published(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn queued_failures_are_returned_once() {
        let publisher = RecordingPublisher::new();
        publisher.fail_next(PublishError::rate_limited("slow down"));

        assert!(publisher.publish("dropped").await.is_err());
        publisher.publish("kept").await.unwrap();
        assert_eq!(publisher.published(), vec!["kept"]);
    }
}
