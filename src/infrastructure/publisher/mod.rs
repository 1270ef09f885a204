//! # Publishers
//!
//! Implementations of the outbound [`Publisher`] port.
//!
//! - [`HttpPublisher`]: Posts to an HTTP API with a bearer token
//! - [`DryRunPublisher`]: Logs instead of posting
//! - [`RecordingPublisher`]: Keeps texts in memory

pub mod dry_run;
pub mod http;
pub mod recording;
pub mod traits;

pub use dry_run::DryRunPublisher;
pub use http::HttpPublisher;
pub use recording::RecordingPublisher;
pub use traits::{DAILY_LIMIT_TEXT, PublishError, PublishResult, Publisher};
