//! # High Scores
//!
//! Per-symbol records and kill streaks, and the medal rules derived from
//! them.
//!
//! The persisted document has the shape:
//!
//! ```json
//! {
//!   "scores": { "XBTUSD": { "highest_day": 0, "highest_week": 0, ... } },
//!   "kills":  { "XBTUSD": { "count": 2, "unix_time": 1700000000 } }
//! }
//! ```

use crate::domain::entities::CombinedLiquidation;
use crate::domain::services::decoration::Medal;
use crate::domain::value_objects::{CalendarMarkers, Symbol, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A streak resets when more than this many seconds pass between kills.
pub const STREAK_WINDOW_SECS: i64 = 60;

/// Kills at most this many seconds apart earn a quick-kill medal.
pub const QUICK_KILL_SECS: i64 = 10;

/// Kills needed for a streak medal.
pub const STREAK_MEDAL_THRESHOLD: u32 = 2;

/// Quantity units per "100k" medal.
pub const HUNDRED_K: f64 = 100_000.0;

/// Upper bound on "100k" medals for one announcement; more never fit.
pub const MAX_HUNDRED_K_MEDALS: usize = 140;

/// Highest quantities seen on a symbol, with the calendar markers they
/// belong to.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scores {
    /// Highest quantity today.
    pub highest_day: f64,
    /// Highest quantity this ISO week.
    pub highest_week: f64,
    /// Highest quantity this month.
    pub highest_month: f64,
    /// Day marker of `highest_day`.
    pub last_day: i32,
    /// ISO week marker of `highest_week`.
    pub last_week: i32,
    /// Month marker of `highest_month`.
    pub last_month: i32,
}

impl Scores {
    /// Zeroes every record whose period has ended.
    ///
    /// Markers only move forward; an earlier marker (clock skew) leaves the
    /// stored record untouched.
    pub fn roll_over(&mut self, markers: CalendarMarkers) {
        if markers.day > self.last_day {
            self.last_day = markers.day;
            self.highest_day = 0.0;
        }
        if markers.week > self.last_week {
            self.last_week = markers.week;
            self.highest_week = 0.0;
        }
        if markers.month > self.last_month {
            self.last_month = markers.month;
            self.highest_month = 0.0;
        }
    }

    /// Records `quantity` and returns the record medals it earns.
    ///
    /// Matching a record counts as setting it.
    pub fn record(&mut self, quantity: f64) -> Vec<Medal> {
        let mut medals = Vec::new();
        if quantity >= self.highest_day {
            self.highest_day = quantity;
        }
        if quantity >= self.highest_week {
            self.highest_week = quantity;
            medals.push(Medal::LargestWeek);
        }
        if quantity >= self.highest_month {
            self.highest_month = quantity;
            medals.push(Medal::LargestMonth);
        }
        medals
    }
}

/// Kill streak on a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Kill {
    /// Liquidations in the current streak.
    pub count: u32,
    /// Unix time, in seconds, of the last contributing liquidation.
    pub unix_time: i64,
}

/// Outcome of adding liquidations to a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakUpdate {
    /// Streak length after the update.
    pub count: u32,
    /// True if the previous kill was at most [`QUICK_KILL_SECS`] ago.
    pub quick_kill: bool,
}

impl Kill {
    /// Adds `kills` liquidations observed at `now_secs`.
    pub fn register(&mut self, kills: usize, now_secs: i64) -> StreakUpdate {
        let gap = now_secs.saturating_sub(self.unix_time);
        if gap > STREAK_WINDOW_SECS {
            self.count = 0;
        }
        self.count = self
            .count
            .saturating_add(u32::try_from(kills).unwrap_or(u32::MAX));
        self.unix_time = now_secs;

        StreakUpdate {
            count: self.count,
            quick_kill: gap <= QUICK_KILL_SECS,
        }
    }
}

/// Medals and streak length awarded to one combined liquidation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Award {
    /// Medals in award order.
    pub medals: Vec<Medal>,
    /// Streak length after this announcement.
    pub streak: u32,
}

/// Records and streaks for every symbol.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HighScores {
    /// Per-symbol records.
    pub scores: HashMap<Symbol, Scores>,
    /// Per-symbol kill streaks.
    pub kills: HashMap<Symbol, Kill>,
}

impl HighScores {
    /// Creates empty high scores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates records and streak for `combined` and returns the medals.
    ///
    /// Medals are awarded in a fixed order: one, week, month, 100k,
    /// streak, quick kill.
    pub fn award(&mut self, combined: &CombinedLiquidation, now: Timestamp) -> Award {
        let mut medals = Vec::new();

        if combined.min_quantity() == 1.0 {
            medals.push(Medal::One);
        }

        let max_quantity = combined.max_quantity();
        let scores = self.scores.entry(combined.symbol().clone()).or_default();
        scores.roll_over(now.calendar_markers());
        medals.extend(scores.record(max_quantity));

        let hundreds = (max_quantity / HUNDRED_K).floor();
        let hundreds = if hundreds.is_finite() && hundreds > 0.0 {
            (hundreds as usize).min(MAX_HUNDRED_K_MEDALS)
        } else {
            0
        };
        medals.extend(std::iter::repeat_n(Medal::HundredK, hundreds));

        let update = self
            .kills
            .entry(combined.symbol().clone())
            .or_default()
            .register(combined.len(), now.timestamp_secs());
        if update.count >= STREAK_MEDAL_THRESHOLD {
            medals.push(Medal::Streak);
        }
        if update.quick_kill {
            medals.push(Medal::QuickKill);
        }

        Award {
            medals,
            streak: update.count,
        }
    }

    /// Records for `symbol`, if any.
    #[must_use]
    pub fn scores_for(&self, symbol: &str) -> Option<&Scores> {
        self.scores.get(symbol)
    }

    /// Streak for `symbol`, if any.
    #[must_use]
    pub fn kill_for(&self, symbol: &str) -> Option<&Kill> {
        self.kills.get(symbol)
    }
}
