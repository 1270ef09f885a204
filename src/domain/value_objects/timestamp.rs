//! # Timestamp Value Object
//!
//! UTC instant and the [`CalendarMarkers`] used to detect day, ISO week and
//! month rollover of high scores.
//!
//! # Examples
//!
//! ```
//! use liquidation_herald::domain::value_objects::timestamp::Timestamp;
//!
//! let ts = Timestamp::from_secs(1704067200).unwrap();
//! assert_eq!(ts.timestamp_secs(), 1704067200);
//! ```

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// A UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// # Returns
    ///
    /// `Some(Timestamp)` if the value is valid, `None` otherwise.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Returns the Unix timestamp in seconds.
    #[inline]
    #[must_use]
    pub fn timestamp_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns the calendar markers (day, ISO week, month) of this instant.
    ///
    /// # Examples
    ///
    /// ```
    /// use liquidation_herald::domain::value_objects::timestamp::Timestamp;
    ///
    /// // 2024-01-01 is a Monday in ISO week 1 of 2024.
    /// let ts = Timestamp::from_secs(1704067200).unwrap();
    /// let markers = ts.calendar_markers();
    /// assert_eq!(markers.week, 202401);
    /// assert_eq!(markers.month, 202401);
    /// ```
    #[must_use]
    pub fn calendar_markers(&self) -> CalendarMarkers {
        let date = self.0.date_naive();
        let iso = date.iso_week();
        CalendarMarkers {
            day: date.num_days_from_ce(),
            week: iso.year() * 100 + iso.week() as i32,
            month: date.year() * 100 + date.month() as i32,
        }
    }
}

/// Calendar position of an instant, used to expire periodic high scores.
///
/// Every marker only grows as time moves forward, so a stored marker is
/// replaced but never rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CalendarMarkers {
    /// Days since the common era.
    pub day: i32,
    /// ISO week-year times 100 plus ISO week number.
    pub week: i32,
    /// Year times 100 plus month number.
    pub month: i32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn now_creates_current_time() {
            let before = Utc::now();
            let ts = Timestamp::now();
            let after = Utc::now();

            assert!(ts.0 >= before);
            assert!(ts.0 <= after);
        }

        #[test]
        fn from_secs_works() {
            let ts = Timestamp::from_secs(1704067200).unwrap();
            assert_eq!(ts.timestamp_secs(), 1704067200);
        }
    }

    mod calendar {
        use super::*;

        #[test]
        fn markers_change_at_day_boundary() {
            // 2024-01-01T23:59:59Z and 2024-01-02T00:00:00Z
            let before = Timestamp::from_secs(1704153599).unwrap();
            let after = Timestamp::from_secs(1704153600).unwrap();

            let a = before.calendar_markers();
            let b = after.calendar_markers();
            assert!(b.day > a.day);
            assert_eq!(a.week, b.week);
            assert_eq!(a.month, b.month);
        }

        #[test]
        fn same_day_of_month_in_next_month_is_a_new_day() {
            // 2024-01-05 and 2024-02-05
            let jan = Timestamp::from_secs(1704412800).unwrap();
            let feb = Timestamp::from_secs(1707091200).unwrap();

            let a = jan.calendar_markers();
            let b = feb.calendar_markers();
            assert!(b.day > a.day);
            assert!(b.month > a.month);
        }

        #[test]
        fn iso_week_spans_year_boundary() {
            // 2024-12-30 (Mon) belongs to ISO week 1 of 2025.
            let ts = Timestamp::from_secs(1735516800).unwrap();
            let markers = ts.calendar_markers();
            assert_eq!(markers.week, 202501);
            assert_eq!(markers.month, 202412);
        }
    }
}
