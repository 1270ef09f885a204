//! # In-Memory High Score Repository
//!
//! In-memory implementation of [`HighScoreRepository`] for testing and for
//! running without a state file.

use crate::domain::services::HighScores;
use crate::infrastructure::persistence::traits::{HighScoreRepository, RepositoryResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory implementation of [`HighScoreRepository`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryHighScoreRepository {
    storage: Arc<RwLock<HighScores>>,
    saves: Arc<AtomicUsize>,
}

impl InMemoryHighScoreRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with `scores`.
    #[must_use]
    pub fn with_scores(scores: HighScores) -> Self {
        Self {
            storage: Arc::new(RwLock::new(scores)),
            saves: Arc::default(),
        }
    }

    /// Number of completed saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Relaxed)
    }

    /// Returns a copy of the stored document.
    pub async fn snapshot(&self) -> HighScores {
        self.storage.read().await.clone()
    }
}

#[async_trait]
impl HighScoreRepository for InMemoryHighScoreRepository {
    async fn load(&self) -> RepositoryResult<HighScores> {
        Ok(self.storage.read().await.clone())
    }

    async fn save(&self, scores: &HighScores) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        *storage = scores.clone();
        self.saves.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::services::Kill;
    use crate::domain::value_objects::Symbol;

    #[tokio::test]
    async fn new_repository_is_empty() {
        let repo = InMemoryHighScoreRepository::new();
        assert_eq!(repo.load().await.unwrap(), HighScores::new());
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn save_replaces_document() {
        let repo = InMemoryHighScoreRepository::new();
        let mut scores = HighScores::new();
        scores.kills.insert(Symbol::new("ETHUSD"), Kill { count: 4, unix_time: 10 });

        repo.save(&scores).await.unwrap();

        assert_eq!(repo.snapshot().await, scores);
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let repo = InMemoryHighScoreRepository::new();
        let other = repo.clone();
        let mut scores = HighScores::new();
        scores.kills.insert(Symbol::new("ETHUSD"), Kill::default());

        other.save(&scores).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), scores);
    }
}
