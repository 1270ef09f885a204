//! # Domain Services
//!
//! Business rules that span several entities.
//!
//! ## Services
//!
//! - [`InstrumentTable`]: Valuation engine over the known instruments
//! - [`HighScores`]: Per-symbol records and kill streaks
//! - [`Decoration`]: Medals, streak label and commentary, budgeted to fit

pub mod decoration;
pub mod high_scores;
pub mod instrument_table;

pub use decoration::{
    CHARACTER_BUDGET, Decoration, Medal, commentary_probability, streak_label, substitute_symbol,
};
pub use high_scores::{Award, HighScores, Kill, Scores, StreakUpdate};
pub use instrument_table::{InstrumentTable, USDT_INDEX, XBT_INDEX};
