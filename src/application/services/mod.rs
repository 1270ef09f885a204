//! # Application Services
//!
//! The concurrent pipeline stages between the feed and the publisher.
//!
//! - [`Orchestrator`]: Routes liquidations to per-symbol aggregators
//! - [`SymbolAggregator`]: Merges bursts on one symbol
//! - [`ScoreKeeper`]: Shared high scores and decoration
//! - [`Dispatcher`]: Rate-limited publishing with load shedding

pub mod aggregator;
pub mod dispatcher;
pub mod orchestrator;
pub mod score_keeper;

pub use aggregator::{DEFAULT_FLUSH_INTERVAL, SymbolAggregator, run_aggregator};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use orchestrator::Orchestrator;
pub use score_keeper::{CommentaryDeck, PreparedNotification, ScoreKeeper};
