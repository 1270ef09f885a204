//! # Domain Layer
//!
//! Pure valuation, combining and scoring rules. Nothing in this layer
//! performs I/O or spawns tasks.
//!
//! - [`value_objects`]: Symbols, sides, timestamps and valued legs
//! - [`entities`]: Instruments and liquidations
//! - [`services`]: Instrument table, high scores and decoration
//! - [`errors`]: Domain error type

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use errors::{DomainError, DomainResult};
