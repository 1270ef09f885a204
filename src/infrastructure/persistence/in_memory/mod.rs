//! # In-Memory Repositories
//!
//! In-memory implementations for testing without touching the filesystem.
//!
//! ## Available Repositories
//!
//! - [`InMemoryHighScoreRepository`]: High score persistence
//!
//! ## Thread Safety
//!
//! Storage is shared through `Arc<RwLock<_>>`, so clones observe each
//! other's writes.

pub mod high_score_repository;

pub use high_score_repository::InMemoryHighScoreRepository;
