//! # Liquidation Entities
//!
//! The raw exchange event, its valued form, and the combined notification
//! unit built from a burst of them.
//!
//! # Combining Rules
//!
//! A [`Liquidation`] may join a [`CombinedLiquidation`] only when:
//!
//! - symbol and side match
//! - fewer than [`MAX_COMBINED_POSITIONS`] constituents are pending
//! - neither the pending constituents nor the newcomer exceed
//!   [`MAX_USD_VALUE_MERGEABLE`]
//! - the newcomer's quantity falls in the same merge bucket as every
//!   pending constituent

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::price_quantity::{display_usd, is_usd_currency};
use crate::domain::value_objects::{PriceQuantity, Side, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Maximum number of liquidations merged into one notification.
pub const MAX_COMBINED_POSITIONS: usize = 3;

/// USD value above which a liquidation is always announced on its own.
pub const MAX_USD_VALUE_MERGEABLE: f64 = 250_000.0;

/// Ascending quantity breakpoints separating the merge buckets.
pub const MERGE_BUCKETS: [i64; 3] = [1, 24_999, 250_000];

/// USD values below this are treated as unpriced when rendering.
const USD_EPSILON: f64 = 0.000_001;

/// A liquidation order as published by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLiquidation {
    /// Exchange order id.
    #[serde(rename = "orderID")]
    pub order_id: String,
    /// Order price.
    pub price: f64,
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Remaining quantity in raw exchange units.
    #[serde(rename = "leavesQty")]
    pub leaves_qty: f64,
    /// Order side.
    pub side: Side,
}

/// A valued liquidation, the unit the aggregators operate on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Liquidation {
    /// Valued leg.
    pub leg: PriceQuantity,
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Order side.
    pub side: Side,
}

impl Liquidation {
    /// Creates a new liquidation.
    #[must_use]
    pub fn new(symbol: impl Into<Symbol>, side: Side, leg: PriceQuantity) -> Self {
        Self {
            leg,
            symbol: symbol.into(),
            side,
        }
    }

    /// Display quantity.
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> f64 {
        self.leg.quantity
    }

    /// USD value, `0` when unpriced.
    #[inline]
    #[must_use]
    pub fn usd_value(&self) -> f64 {
        self.leg.total_usd_value
    }

    /// Minimum time to wait for further liquidations to combine with.
    ///
    /// Smaller positions wait longer.
    ///
    /// | quantity        | delay |
    /// |-----------------|-------|
    /// | < 1,000         | 30s   |
    /// | < 25,000        | 20s   |
    /// | < 125,000       | 15s   |
    /// | otherwise       | 10s   |
    #[must_use]
    pub fn combining_delay(&self) -> Duration {
        let quantity = self.quantity();
        let secs = if quantity < 1_000.0 {
            30
        } else if quantity < 25_000.0 {
            20
        } else if quantity < 125_000.0 {
            15
        } else {
            10
        };
        Duration::from_secs(secs)
    }

    /// Wraps this liquidation into a single-entry combined liquidation.
    #[must_use]
    pub fn into_combined(self) -> CombinedLiquidation {
        CombinedLiquidation {
            symbol: self.symbol,
            side: self.side,
            liquidations: vec![self.leg],
        }
    }
}

/// Returns the merge bucket index of a quantity.
///
/// The quantity is truncated to an integer and located with a lower-bound
/// search over [`MERGE_BUCKETS`], so a breakpoint belongs to the bucket
/// below it.
#[must_use]
pub fn merge_bucket(quantity: f64) -> usize {
    let quantity = quantity.trunc() as i64;
    MERGE_BUCKETS.partition_point(|&breakpoint| breakpoint < quantity)
}

/// A burst of liquidations on one symbol and side, announced together.
///
/// Constituents are kept in arrival order and always share the symbol and
/// side of the combined liquidation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedLiquidation {
    symbol: Symbol,
    side: Side,
    liquidations: Vec<PriceQuantity>,
}

impl CombinedLiquidation {
    /// Symbol of every constituent.
    #[must_use]
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Side of every constituent.
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Constituent legs in arrival order.
    #[must_use]
    pub fn liquidations(&self) -> &[PriceQuantity] {
        &self.liquidations
    }

    /// Number of constituents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.liquidations.len()
    }

    /// Always false for a combined liquidation built from a liquidation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.liquidations.is_empty()
    }

    /// Returns true if `liquidation` may be merged into this one.
    #[must_use]
    pub fn can_combine(&self, liquidation: &Liquidation) -> bool {
        if self.side != liquidation.side || self.symbol != liquidation.symbol {
            return false;
        }

        if self.liquidations.len() >= MAX_COMBINED_POSITIONS {
            return false;
        }

        if liquidation.usd_value() > MAX_USD_VALUE_MERGEABLE
            || self
                .liquidations
                .iter()
                .any(|leg| leg.total_usd_value > MAX_USD_VALUE_MERGEABLE)
        {
            return false;
        }

        let bucket = merge_bucket(liquidation.quantity());
        self.liquidations
            .iter()
            .all(|leg| merge_bucket(leg.quantity) == bucket)
    }

    /// Merges `liquidation` into this combined liquidation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CannotCombine` if [`can_combine`](Self::can_combine)
    /// rejects it; the combined liquidation is left unchanged.
    pub fn combine(&mut self, liquidation: Liquidation) -> DomainResult<()> {
        if !self.can_combine(&liquidation) {
            return Err(DomainError::CannotCombine {
                symbol: self.symbol.clone(),
                side: self.side,
                incoming_symbol: liquidation.symbol,
                incoming_side: liquidation.side,
            });
        }

        self.liquidations.push(liquidation.leg);
        Ok(())
    }

    /// Sum of the constituents' USD values.
    #[must_use]
    pub fn usd_value(&self) -> f64 {
        self.liquidations.iter().map(|l| l.total_usd_value).sum()
    }

    /// Sum of the constituents' quantities.
    #[must_use]
    pub fn total_quantity(&self) -> f64 {
        self.liquidations.iter().map(|l| l.quantity).sum()
    }

    /// Largest constituent quantity, `0` when empty.
    #[must_use]
    pub fn max_quantity(&self) -> f64 {
        self.liquidations
            .iter()
            .map(|l| l.quantity)
            .fold(0.0, f64::max)
    }

    /// Smallest constituent quantity, `0` when empty.
    #[must_use]
    pub fn min_quantity(&self) -> f64 {
        self.liquidations
            .iter()
            .map(|l| l.quantity)
            .reduce(f64::min)
            .unwrap_or(0.0)
    }
}

impl fmt::Display for CombinedLiquidation {
    /// Renders the announcement text.
    ///
    /// ```text
    /// Liquidated short on XBTUSD: Buy 130,170 + 1,200 @ 772.5
    /// Liquidated long on ETHUSD: Sell 100 + 200 Cont @ 772.02, 734.01 (≈ $1,234)
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.liquidations.first() else {
            return write!(
                f,
                "Liquidated {} on {}: {}",
                self.side.liquidated_position(),
                self.symbol,
                self.side
            );
        };

        let quantities = self
            .liquidations
            .iter()
            .map(PriceQuantity::display_quantity)
            .collect::<Vec<_>>()
            .join(" + ");

        let first_price = first.display_price();
        let prices = if self
            .liquidations
            .iter()
            .all(|l| l.display_price() == first_price)
        {
            first_price
        } else {
            self.liquidations
                .iter()
                .map(PriceQuantity::display_price)
                .collect::<Vec<_>>()
                .join(", ")
        };

        write!(
            f,
            "Liquidated {} on {}: {} {}",
            self.side.liquidated_position(),
            self.symbol,
            self.side,
            quantities
        )?;

        if is_usd_currency(&first.currency) {
            return write!(f, " @ {prices}");
        }

        write!(f, " {} @ {prices}", first.currency)?;

        let usd = self.usd_value();
        if usd >= USD_EPSILON {
            write!(f, " (≈ ${})", display_usd(usd))?;
        }
        Ok(())
    }
}
