//! # Application Layer
//!
//! Pipeline tasks built on the domain rules and the infrastructure ports.
//!
//! ```text
//! feed ──▶ Orchestrator ──▶ SymbolAggregator (one per symbol)
//!                                 │ ScoreKeeper::prepare
//!                                 ▼
//!                            Dispatcher ──▶ Publisher
//! ```

pub mod error;
pub mod runtime;
pub mod services;

pub use error::{ApplicationError, ApplicationResult};
pub use runtime::Herald;
