//! # Score Keeper
//!
//! Shared owner of the high scores, the commentary deck and the streak
//! labels. Every symbol's aggregator calls into it when it flushes, so all
//! access goes through one lock, held across the persistence write.
//!
//! # Decoration Steps
//!
//! 1. Roll the symbol's records over into the current day, week and month
//! 2. Award record, 100k, streak and quick-kill medals
//! 3. Maybe draw a commentary line; the odds grow with the USD value
//! 4. Label the kill streak
//! 5. Save the high scores; a failed save is logged and ignored

use crate::domain::entities::CombinedLiquidation;
use crate::domain::services::{
    Decoration, HighScores, commentary_probability, streak_label, substitute_symbol,
};
use crate::domain::value_objects::Timestamp;
use crate::infrastructure::persistence::{HighScoreRepository, RepositoryResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Decorated text ready for the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedNotification {
    /// Text to publish, within the character budget.
    pub text: String,
    /// When the notification was prepared; the dispatcher measures lag
    /// from here.
    pub created_at: Instant,
    /// USD value of the combined liquidation.
    pub usd_value: f64,
}

/// Commentary lines dealt round-robin from a shuffled deck.
///
/// The deck is reshuffled each time the index wraps back to the start.
#[derive(Debug, Clone, Default)]
pub struct CommentaryDeck {
    lines: Vec<String>,
    index: usize,
}

impl CommentaryDeck {
    /// Creates a deck and shuffles it.
    pub fn new<R: Rng + ?Sized>(lines: Vec<String>, rng: &mut R) -> Self {
        let mut deck = Self { lines, index: 0 };
        deck.reshuffle(rng);
        deck
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the deck has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Deals the next line, or `None` from an empty deck.
    pub fn deal<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&str> {
        if self.lines.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.lines.len();
        if self.index == 0 {
            self.reshuffle(rng);
        }
        self.lines.get(self.index).map(String::as_str)
    }

    fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.index = 0;
        self.lines.shuffle(rng);
        debug!(lines = self.lines.len(), "commentary deck shuffled");
    }
}

struct KeeperState {
    scores: HighScores,
    deck: CommentaryDeck,
    rng: StdRng,
}

/// Lock-protected high scores and decoration assets.
pub struct ScoreKeeper {
    state: Mutex<KeeperState>,
    streak_labels: Vec<String>,
    repository: Arc<dyn HighScoreRepository>,
}

impl fmt::Debug for ScoreKeeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreKeeper")
            .field("streak_labels", &self.streak_labels.len())
            .field("repository", &self.repository)
            .finish_non_exhaustive()
    }
}

impl ScoreKeeper {
    /// Creates a keeper over existing scores.
    #[must_use]
    pub fn new(
        scores: HighScores,
        commentary: Vec<String>,
        streak_labels: Vec<String>,
        repository: Arc<dyn HighScoreRepository>,
        mut rng: StdRng,
    ) -> Self {
        let deck = CommentaryDeck::new(commentary, &mut rng);
        Self {
            state: Mutex::new(KeeperState { scores, deck, rng }),
            streak_labels,
            repository,
        }
    }

    /// Creates a keeper from the scores stored in `repository`, seeded from
    /// OS entropy.
    ///
    /// # Errors
    ///
    /// Returns a `RepositoryError` if the stored scores cannot be read.
    pub async fn load(
        repository: Arc<dyn HighScoreRepository>,
        commentary: Vec<String>,
        streak_labels: Vec<String>,
    ) -> RepositoryResult<Self> {
        let scores = repository.load().await?;
        debug!(
            symbols = scores.scores.len(),
            streaks = scores.kills.len(),
            "high scores loaded"
        );
        Ok(Self::new(
            scores,
            commentary,
            streak_labels,
            repository,
            StdRng::from_entropy(),
        ))
    }

    /// Decorates `combined` as of now.
    pub async fn decorate(&self, combined: &CombinedLiquidation) -> Decoration {
        self.decorate_at(combined, Timestamp::now()).await
    }

    /// Decorates `combined` as of `now`, updating and saving the scores.
    pub async fn decorate_at(&self, combined: &CombinedLiquidation, now: Timestamp) -> Decoration {
        let mut state = self.state.lock().await;
        let KeeperState { scores, deck, rng } = &mut *state;
        let symbol = combined.symbol().as_str();

        let award = scores.award(combined, now);

        let odds = commentary_probability(combined.usd_value());
        let commentary = if odds > 0.0 && rng.gen_bool(odds.clamp(0.0, 1.0)) {
            deck.deal(rng).map(|line| substitute_symbol(line, symbol))
        } else {
            None
        };

        let streak = streak_label(award.streak, &self.streak_labels, symbol);

        if let Err(error) = self.repository.save(scores).await {
            warn!(%error, symbol, "failed to save high scores");
        }

        Decoration {
            streak,
            medals: award.medals,
            commentary,
        }
    }

    /// Decorates `combined` and renders the text to publish.
    pub async fn prepare(&self, combined: &CombinedLiquidation) -> PreparedNotification {
        let decoration = self.decorate(combined).await;
        PreparedNotification {
            text: decoration.apply(&combined.to_string()),
            created_at: Instant::now(),
            usd_value: combined.usd_value(),
        }
    }

    /// Copy of the current high scores.
    pub async fn snapshot(&self) -> HighScores {
        self.state.lock().await.scores.clone()
    }
}
