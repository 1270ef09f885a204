//! # Text Assets
//!
//! Line-delimited text decks loaded once at startup: the commentary deck
//! and the streak labels. Each line may contain a `$SYMBOL` placeholder.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Error loading a text deck.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The deck file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Deck path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl AssetError {
    /// Path of the deck that failed to load.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } => path,
        }
    }
}

/// Splits deck text into trimmed, non-blank lines.
#[must_use]
pub fn parse_deck(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Loads the deck at `path`.
///
/// # Errors
///
/// Returns `AssetError::Read` if the file is missing or unreadable.
pub async fn load_deck(path: &Path) -> Result<Vec<String>, AssetError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AssetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let deck = parse_deck(&text);
    debug!(path = %path.display(), lines = deck.len(), "deck loaded");
    Ok(deck)
}
