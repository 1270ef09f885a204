//! # Exchange Feed
//!
//! Everything between the exchange's realtime websocket and the valued
//! liquidation queue.
//!
//! - [`messages`]: Typed table message envelope
//! - [`ingestion`]: [`FeedIngester`], instrument table upkeep and dedup
//! - [`websocket`]: Transport, keep-alive and reconnect loop
//! - [`error`]: [`FeedError`]

pub mod error;
pub mod ingestion;
pub mod messages;
pub mod websocket;

pub use error::{FeedError, FeedResult};
pub use ingestion::{DEFAULT_DEDUP_HORIZON, FeedIngester};
pub use messages::{Action, Envelope};
pub use websocket::{run_feed, run_session};
