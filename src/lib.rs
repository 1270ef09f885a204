//! # Liquidation Herald
//!
//! Watches an exchange's realtime liquidation feed, values every
//! liquidation in USD, merges bursts on the same symbol into one
//! announcement, decorates it with records, streaks and commentary, and
//! publishes it through a rate-limited channel that sheds low-value
//! announcements under load.
//!
//! # Layers
//!
//! - [`domain`]: Valuation, combining, scoring and rendering rules
//! - [`application`]: Aggregators, score keeper, dispatcher, orchestrator
//! - [`infrastructure`]: Feed transport, publishers, persistence, rate limit
//! - [`config`]: Layered configuration

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{ApplicationError, ApplicationResult};
pub use config::AppConfig;
