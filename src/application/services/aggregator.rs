//! # Symbol Aggregator
//!
//! Per-symbol state machine that merges bursts of liquidations into one
//! announcement.
//!
//! ```text
//!            liquidation                    incompatible liquidation
//!   Idle ─────────────────▶ Pending ◀──────────────────────────────┐
//!    ▲                       │  │ compatible: merge, keep timer     │
//!    │  tick after delay     │  └───────────────────────────────────┘
//!    └───────────────────────┘        (flush the old one first)
//! ```
//!
//! The combining delay is fixed by the liquidation that opened the pending
//! announcement; merges never extend it.

use crate::application::services::score_keeper::{PreparedNotification, ScoreKeeper};
use crate::domain::entities::{CombinedLiquidation, Liquidation};
use crate::domain::value_objects::Symbol;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

/// Default cadence of the pending-flush check.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug)]
struct Pending {
    combined: CombinedLiquidation,
    received_at: Instant,
    delay: Duration,
}

impl Pending {
    fn open(liquidation: Liquidation, now: Instant) -> Self {
        Self {
            delay: liquidation.combining_delay(),
            combined: liquidation.into_combined(),
            received_at: now,
        }
    }
}

/// Combining state of one symbol.
#[derive(Debug, Default)]
pub struct SymbolAggregator {
    pending: Option<Pending>,
}

impl SymbolAggregator {
    /// Creates an idle aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while an announcement is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending announcement, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&CombinedLiquidation> {
        self.pending.as_ref().map(|p| &p.combined)
    }

    /// Handles a liquidation arriving at `now`.
    ///
    /// Returns the previously pending announcement if the liquidation could
    /// not join it.
    pub fn on_liquidation(
        &mut self,
        liquidation: Liquidation,
        now: Instant,
    ) -> Option<CombinedLiquidation> {
        match self.pending.take() {
            Some(mut pending) if pending.combined.can_combine(&liquidation) => {
                let joined = pending.combined.combine(liquidation);
                debug_assert!(joined.is_ok(), "combine rejected after can_combine");
                self.pending = Some(pending);
                None
            }
            Some(pending) => {
                debug!(
                    symbol = %pending.combined.symbol(),
                    "cannot combine, flushing pending"
                );
                self.pending = Some(Pending::open(liquidation, now));
                Some(pending.combined)
            }
            None => {
                self.pending = Some(Pending::open(liquidation, now));
                None
            }
        }
    }

    /// Handles a flush tick at `now`.
    ///
    /// Returns the pending announcement once its combining delay has
    /// elapsed.
    pub fn on_tick(&mut self, now: Instant) -> Option<CombinedLiquidation> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|p| now.saturating_duration_since(p.received_at) >= p.delay);
        if due {
            self.drain()
        } else {
            None
        }
    }

    /// Takes the pending announcement regardless of its delay.
    pub fn drain(&mut self) -> Option<CombinedLiquidation> {
        self.pending.take().map(|p| p.combined)
    }
}

/// Runs the aggregator task for `symbol`.
///
/// Ends once `liquidations` is closed and drained; a pending announcement
/// is flushed on the way out.
pub async fn run_aggregator(
    symbol: Symbol,
    mut liquidations: mpsc::Receiver<Liquidation>,
    flush_interval: Duration,
    keeper: Arc<ScoreKeeper>,
    notifications: mpsc::Sender<PreparedNotification>,
) {
    let mut aggregator = SymbolAggregator::new();
    let mut ticker = interval_at(Instant::now() + flush_interval, flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    debug!(%symbol, "aggregator started");

    loop {
        let flushed = tokio::select! {
            _ = ticker.tick() => aggregator.on_tick(Instant::now()),
            received = liquidations.recv() => match received {
                Some(liquidation) => aggregator.on_liquidation(liquidation, Instant::now()),
                None => break,
            },
        };

        if let Some(combined) = flushed {
            emit(&keeper, &notifications, &combined).await;
        }
    }

    if let Some(combined) = aggregator.drain() {
        emit(&keeper, &notifications, &combined).await;
    }
    debug!(%symbol, "aggregator stopped");
}

async fn emit(
    keeper: &ScoreKeeper,
    notifications: &mpsc::Sender<PreparedNotification>,
    combined: &CombinedLiquidation,
) {
    let prepared = keeper.prepare(combined).await;
    debug!(text = %prepared.text, usd_value = prepared.usd_value, "announcement prepared");
    if notifications.send(prepared).await.is_err() {
        warn!(symbol = %combined.symbol(), "notification queue closed, announcement lost");
    }
}
