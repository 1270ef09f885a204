//! # Persistence Layer
//!
//! Durable storage of the high score document.
//!
//! ## Repository Traits (Ports)
//!
//! - [`HighScoreRepository`]: Load and save [`HighScores`](crate::domain::services::HighScores)
//!
//! ## Implementations
//!
//! - [`json_file`]: JSON document on disk, atomically replaced
//! - [`in_memory`]: In-memory implementation for testing

pub mod in_memory;
pub mod json_file;
pub mod traits;

pub use in_memory::InMemoryHighScoreRepository;
pub use json_file::JsonFileHighScoreRepository;
pub use traits::{HighScoreRepository, RepositoryError, RepositoryResult};
