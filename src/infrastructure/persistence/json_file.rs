//! # JSON File Repository
//!
//! [`HighScoreRepository`] backed by a single JSON document on disk.
//!
//! Writes go to a sibling temporary file which is then renamed over the
//! target, so a crash mid-write never leaves a truncated document behind.

use crate::domain::services::HighScores;
use crate::infrastructure::persistence::traits::{HighScoreRepository, RepositoryResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// High scores stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileHighScoreRepository {
    path: PathBuf,
}

impl JsonFileHighScoreRepository {
    /// Creates a repository for the document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl HighScoreRepository for JsonFileHighScoreRepository {
    async fn load(&self) -> RepositoryResult<HighScores> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no high score file, starting empty");
                return Ok(HighScores::new());
            }
            Err(err) => return Err(err.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, scores: &HighScores) -> RepositoryResult<()> {
        let bytes = serde_json::to_vec_pretty(scores)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}
