//! # Feed Messages
//!
//! Typed decoding of the exchange's realtime table messages:
//!
//! ```json
//! {"table": "liquidation", "action": "insert", "data": [{"orderID": "...", ...}]}
//! ```
//!
//! The envelope is decoded first and each record in `data` is decoded on
//! its own, so one malformed record never costs the rest of the batch.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Realtime table carrying instrument metadata.
pub const INSTRUMENT_TABLE: &str = "instrument";

/// Realtime table carrying liquidation orders.
pub const LIQUIDATION_TABLE: &str = "liquidation";

/// Lifecycle action of a table message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Full snapshot of the table.
    Partial,
    /// New rows.
    Insert,
    /// Changed rows.
    Update,
    /// Removed rows.
    Delete,
    /// Any other action.
    #[serde(other)]
    Other,
}

/// A realtime frame, before its rows are decoded.
///
/// Subscription acknowledgements and informational frames carry no
/// `table` and decode with every field empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    /// Table name.
    #[serde(default)]
    pub table: Option<String>,
    /// Lifecycle action.
    #[serde(default)]
    pub action: Option<Action>,
    /// Error reported by the exchange.
    #[serde(default)]
    pub error: Option<String>,
    /// Raw rows.
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl Envelope {
    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the frame is not a table envelope.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Returns the exchange error, if the frame carries a non-empty one.
    #[must_use]
    pub fn upstream_error(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }

    /// Decodes every row as `T`, logging and skipping rows that fail.
    #[must_use]
    pub fn records<T: DeserializeOwned>(self) -> Vec<T> {
        let table = self.table.unwrap_or_default();
        self.data
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<T>(row) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(table = %table, %error, "dropping malformed record");
                    None
                }
            })
            .collect()
    }
}
