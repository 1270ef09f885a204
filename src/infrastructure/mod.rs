//! # Infrastructure Layer
//!
//! Adapters between the pipeline and the outside world.
//!
//! - [`feed`]: Exchange websocket feed and ingestion
//! - [`publisher`]: Outbound posting
//! - [`persistence`]: High score storage
//! - [`rate_limit`]: Token bucket
//! - [`assets`]: Text decks

pub mod assets;
pub mod feed;
pub mod persistence;
pub mod publisher;
pub mod rate_limit;
