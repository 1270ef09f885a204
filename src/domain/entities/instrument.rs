//! # Instrument Entity
//!
//! Per-symbol instrument metadata and the contract-value formulas derived
//! from it.
//!
//! Three valuation regimes exist, selected by the instrument flags:
//!
//! ```text
//! inverse  - P&L settles in the base asset; quantity is already in the
//!            position currency (usually USD)
//! quanto   - fixed notional per contract in the settlement currency
//! linear   - quantity x price yields notional in the quote currency
//! ```
//!
//! Every formula fails closed: a zero denominator or a non-finite
//! intermediate result yields `0`, which callers treat as "unpriced".

use crate::domain::value_objects::{InstrumentType, Symbol};
use serde::{Deserialize, Deserializer, Serialize};

/// Exchange instrument metadata and live prices.
///
/// Created from a full snapshot and selectively overwritten by
/// [`InstrumentUpdate`]s.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Exchange classification code.
    #[serde(rename = "typ", default, deserialize_with = "null_as_default")]
    pub instrument_type: InstrumentType,

    /// Best ask.
    #[serde(default)]
    pub ask_price: Option<f64>,
    /// Best bid.
    #[serde(default)]
    pub bid_price: Option<f64>,
    /// Last traded price.
    #[serde(default)]
    pub last_price: Option<f64>,
    /// Mark price.
    #[serde(default)]
    pub mark_price: Option<f64>,
    /// Minimum price increment.
    #[serde(default)]
    pub tick_size: Option<f64>,
    /// Minimum order quantity increment, in contracts.
    #[serde(default)]
    pub lot_size: Option<f64>,
    /// Contract multiplier; negative for inverse contracts.
    #[serde(default)]
    pub multiplier: Option<f64>,

    /// Inverse contract flag.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_inverse: bool,
    /// Quanto contract flag.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_quanto: bool,

    /// Symbol used for cross-rate lookups of the quote currency.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reference_symbol: Symbol,
    /// Currency the position is denominated in.
    #[serde(default, deserialize_with = "null_as_default")]
    pub position_currency: String,
    /// Quote currency.
    #[serde(default, deserialize_with = "null_as_default")]
    pub quote_currency: String,
    /// Settlement currency.
    #[serde(rename = "settlCurrency", default, deserialize_with = "null_as_default")]
    pub settle_currency: String,
    /// Quote to settlement currency multiplier.
    #[serde(default)]
    pub quote_to_settle_multiplier: Option<f64>,
    /// Underlying asset.
    #[serde(default, deserialize_with = "null_as_default")]
    pub underlying: String,
    /// Underlying index symbol.
    #[serde(default, deserialize_with = "null_as_default")]
    pub underlying_symbol: String,
    /// Underlying to position currency multiplier.
    #[serde(default)]
    pub underlying_to_position_multiplier: Option<f64>,
    /// Underlying to settlement currency multiplier.
    #[serde(default)]
    pub underlying_to_settle_multiplier: Option<f64>,
}

/// A partial instrument record from an incremental update.
///
/// Only the fields present in the update are applied; an absent field never
/// clears a previously known value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentUpdate {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Exchange classification code.
    #[serde(rename = "typ", default)]
    pub instrument_type: Option<InstrumentType>,
    /// Best ask.
    #[serde(default)]
    pub ask_price: Option<f64>,
    /// Best bid.
    #[serde(default)]
    pub bid_price: Option<f64>,
    /// Last traded price.
    #[serde(default)]
    pub last_price: Option<f64>,
    /// Mark price.
    #[serde(default)]
    pub mark_price: Option<f64>,
    /// Minimum price increment.
    #[serde(default)]
    pub tick_size: Option<f64>,
    /// Minimum order quantity increment.
    #[serde(default)]
    pub lot_size: Option<f64>,
    /// Contract multiplier.
    #[serde(default)]
    pub multiplier: Option<f64>,
    /// Inverse contract flag.
    #[serde(default)]
    pub is_inverse: Option<bool>,
    /// Quanto contract flag.
    #[serde(default)]
    pub is_quanto: Option<bool>,
    /// Symbol used for cross-rate lookups.
    #[serde(default)]
    pub reference_symbol: Option<Symbol>,
    /// Position currency.
    #[serde(default)]
    pub position_currency: Option<String>,
    /// Quote currency.
    #[serde(default)]
    pub quote_currency: Option<String>,
    /// Settlement currency.
    #[serde(rename = "settlCurrency", default)]
    pub settle_currency: Option<String>,
    /// Quote to settlement currency multiplier.
    #[serde(default)]
    pub quote_to_settle_multiplier: Option<f64>,
    /// Underlying asset.
    #[serde(default)]
    pub underlying: Option<String>,
    /// Underlying index symbol.
    #[serde(default)]
    pub underlying_symbol: Option<String>,
    /// Underlying to position currency multiplier.
    #[serde(default)]
    pub underlying_to_position_multiplier: Option<f64>,
    /// Underlying to settlement currency multiplier.
    #[serde(default)]
    pub underlying_to_settle_multiplier: Option<f64>,
}

impl InstrumentUpdate {
    /// Creates an update carrying only a new mark price.
    #[must_use]
    pub fn mark_price(symbol: impl Into<Symbol>, mark_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            mark_price: Some(mark_price),
            ..Self::default()
        }
    }
}

fn overwrite<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn overwrite_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

impl Instrument {
    /// Applies the fields present in `update` to this instrument.
    pub fn apply(&mut self, update: InstrumentUpdate) {
        overwrite(&mut self.instrument_type, update.instrument_type);
        overwrite_opt(&mut self.ask_price, update.ask_price);
        overwrite_opt(&mut self.bid_price, update.bid_price);
        overwrite_opt(&mut self.last_price, update.last_price);
        overwrite_opt(&mut self.mark_price, update.mark_price);
        overwrite_opt(&mut self.tick_size, update.tick_size);
        overwrite_opt(&mut self.lot_size, update.lot_size);
        overwrite_opt(&mut self.multiplier, update.multiplier);
        overwrite(&mut self.is_inverse, update.is_inverse);
        overwrite(&mut self.is_quanto, update.is_quanto);
        overwrite(&mut self.reference_symbol, update.reference_symbol);
        overwrite(&mut self.position_currency, update.position_currency);
        overwrite(&mut self.quote_currency, update.quote_currency);
        overwrite(&mut self.settle_currency, update.settle_currency);
        overwrite_opt(
            &mut self.quote_to_settle_multiplier,
            update.quote_to_settle_multiplier,
        );
        overwrite(&mut self.underlying, update.underlying);
        overwrite(&mut self.underlying_symbol, update.underlying_symbol);
        overwrite_opt(
            &mut self.underlying_to_position_multiplier,
            update.underlying_to_position_multiplier,
        );
        overwrite_opt(
            &mut self.underlying_to_settle_multiplier,
            update.underlying_to_settle_multiplier,
        );
    }

    /// Mark price, `0` when unknown.
    #[inline]
    #[must_use]
    pub fn mark(&self) -> f64 {
        self.mark_price.unwrap_or(0.0)
    }

    /// Tick size, `0` when unknown.
    #[inline]
    #[must_use]
    pub fn tick(&self) -> f64 {
        self.tick_size.unwrap_or(0.0)
    }

    fn lot(&self) -> f64 {
        self.lot_size.unwrap_or(0.0)
    }

    fn mult(&self) -> f64 {
        self.multiplier.unwrap_or(0.0)
    }

    fn underlying_to_settle(&self) -> f64 {
        self.underlying_to_settle_multiplier.unwrap_or(0.0)
    }

    /// Value of one contract in XBT terms.
    ///
    /// A multiplier of exactly one prices the lot at the mark; a positive
    /// multiplier scales it; a negative (inverse) multiplier divides by the
    /// mark instead.
    #[must_use]
    pub fn contract_value_in_xbt(&self) -> f64 {
        let lot = self.lot();
        let multiplier = self.mult();
        let mark = self.mark();

        let lot_value = if multiplier.trunc() == 1.0 {
            lot * mark
        } else if multiplier > 0.0 {
            lot * multiplier * mark
        } else {
            ratio(lot * multiplier, mark)
        };

        ratio(lot_value, lot).abs()
    }

    /// Value of one contract.
    #[must_use]
    pub fn contract_value(&self) -> f64 {
        if self.is_quanto {
            return self.contract_value_in_xbt();
        }

        if self.is_inverse {
            return ratio(self.mult(), self.underlying_to_settle()).abs();
        }

        1.0
    }

    /// Notional value of one contract, in the settlement currency.
    #[must_use]
    pub fn notional_value(&self) -> f64 {
        if self.is_inverse {
            return ratio(
                self.contract_value() * self.mult(),
                self.underlying_to_settle(),
            );
        }

        if self.is_quanto {
            return self.contract_value();
        }

        match self.underlying_to_position_multiplier {
            Some(to_position) => ratio(self.contract_value(), to_position),
            None => self.contract_value(),
        }
    }

    /// Minimum amount a position can be entered with, in display units.
    #[must_use]
    pub fn min_step(&self) -> f64 {
        if self.is_inverse {
            return ratio(self.lot() * self.mult(), self.underlying_to_settle());
        }

        if self.is_quanto {
            return self.lot();
        }

        match self.underlying_to_position_multiplier {
            Some(to_position) => ratio(self.lot(), to_position),
            None => self.lot(),
        }
    }
}

impl From<InstrumentUpdate> for Instrument {
    fn from(update: InstrumentUpdate) -> Self {
        let mut instrument = Instrument {
            symbol: update.symbol.clone(),
            ..Instrument::default()
        };
        instrument.apply(update);
        instrument
    }
}

/// Divides, returning `0` for a zero denominator or a non-finite result.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() { value } else { 0.0 }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
