//! # Feed Ingestion
//!
//! Turns realtime table messages into valued liquidations.
//!
//! | table         | action             | effect                                  |
//! |---------------|--------------------|-----------------------------------------|
//! | `instrument`  | `partial`          | load the instrument table               |
//! | `instrument`  | `insert`/`update`  | apply partial instrument updates        |
//! | `liquidation` | `partial`          | mark the existing order ids as seen     |
//! | `liquidation` | `insert`           | dedup, value and forward                |
//! | `liquidation` | `update`/`delete`  | ignored, an announcement can't be taken back |
//!
//! Inserts are dropped until the first instrument snapshot arrives. Order
//! ids are remembered for a bounded horizon so a re-inserted order is
//! announced once.

use crate::domain::entities::{Instrument, InstrumentUpdate, Liquidation, RawLiquidation};
use crate::domain::services::InstrumentTable;
use crate::infrastructure::feed::error::{FeedError, FeedResult};
use crate::infrastructure::feed::messages::{Action, Envelope, INSTRUMENT_TABLE, LIQUIDATION_TABLE};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default time an order id is remembered.
pub const DEFAULT_DEDUP_HORIZON: Duration = Duration::from_secs(4 * 60 * 60);

/// Stateful consumer of the realtime feed.
///
/// Owns the [`InstrumentTable`]; nothing else mutates it.
#[derive(Debug)]
pub struct FeedIngester {
    table: InstrumentTable,
    loaded: bool,
    seen: HashMap<String, Instant>,
    horizon: Duration,
}

impl Default for FeedIngester {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_HORIZON)
    }
}

impl FeedIngester {
    /// Creates an ingester remembering order ids for `horizon`.
    #[must_use]
    pub fn new(horizon: Duration) -> Self {
        Self {
            table: InstrumentTable::new(),
            loaded: false,
            seen: HashMap::new(),
            horizon,
        }
    }

    /// The instrument table.
    #[must_use]
    pub fn table(&self) -> &InstrumentTable {
        &self.table
    }

    /// Returns true once an instrument snapshot has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Number of remembered order ids.
    #[must_use]
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// Handles one text frame received at `now`.
    ///
    /// Returns the liquidations to forward, in feed order. Malformed frames
    /// and records are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Upstream` if the exchange reported an error.
    pub fn ingest(&mut self, text: &str, now: Instant) -> FeedResult<Vec<Liquidation>> {
        let envelope = match Envelope::parse(text) {
            Ok(envelope) => envelope,
            Err(error) => {
                warn!(%error, "dropping malformed frame");
                return Ok(Vec::new());
            }
        };

        if let Some(error) = envelope.upstream_error() {
            return Err(FeedError::upstream(error));
        }

        let (Some(table), Some(action)) = (envelope.table.clone(), envelope.action) else {
            debug!("ignoring frame without table");
            return Ok(Vec::new());
        };

        match (table.as_str(), action) {
            (INSTRUMENT_TABLE, Action::Partial) => {
                let instruments: Vec<Instrument> = envelope.records();
                info!(count = instruments.len(), "instrument snapshot loaded");
                self.table.load(instruments);
                self.loaded = true;
                Ok(Vec::new())
            }
            (INSTRUMENT_TABLE, Action::Insert | Action::Update) => {
                for update in envelope.records::<InstrumentUpdate>() {
                    self.table.update(update);
                }
                Ok(Vec::new())
            }
            (LIQUIDATION_TABLE, Action::Partial) => {
                let existing: Vec<RawLiquidation> = envelope.records();
                debug!(count = existing.len(), "marking open liquidations as seen");
                for raw in existing {
                    self.seen.insert(raw.order_id, now);
                }
                Ok(Vec::new())
            }
            (LIQUIDATION_TABLE, Action::Insert) => {
                if !self.loaded {
                    debug!("instrument table not loaded, skipping liquidations");
                    return Ok(Vec::new());
                }
                self.prune(now);
                let inserts: Vec<RawLiquidation> = envelope.records();
                Ok(self.value_inserts(inserts, now))
            }
            _ => Ok(Vec::new()),
        }
    }

    fn prune(&mut self, now: Instant) {
        let horizon = self.horizon;
        self.seen
            .retain(|_, seen_at| now.saturating_duration_since(*seen_at) <= horizon);
    }

    fn value_inserts(&mut self, inserts: Vec<RawLiquidation>, now: Instant) -> Vec<Liquidation> {
        let mut valued = Vec::with_capacity(inserts.len());
        for raw in inserts {
            if self.seen.contains_key(&raw.order_id) {
                debug!(order_id = %raw.order_id, "skipping already seen order");
                continue;
            }
            self.seen.insert(raw.order_id.clone(), now);

            match self.table.process(&raw) {
                Ok(liquidation) => valued.push(liquidation),
                Err(error) => {
                    warn!(order_id = %raw.order_id, symbol = %raw.symbol, %error, "dropping liquidation");
                }
            }
        }
        valued
    }
}
