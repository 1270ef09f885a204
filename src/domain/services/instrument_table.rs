//! # Instrument Table
//!
//! The valuation engine: owns every known [`Instrument`] and converts raw
//! liquidations into valued [`Liquidation`]s.
//!
//! The table is mutated only by the ingestion path (snapshot load and
//! incremental updates) and is confined to that task, so no lock is needed.
//!
//! # Currency Resolution
//!
//! | currency      | USD price                                   |
//! |---------------|---------------------------------------------|
//! | `USD`         | 1                                           |
//! | `XBT` / `XBt` | mark of [`XBT_INDEX`] (÷ 1e8 for `XBt`)     |
//! | `USDT`/`USDt` | mark of [`USDT_INDEX`] (÷ 1e8 for `USDt`)   |
//! | other         | USD-quoted price index on that underlying   |
//!
//! An unresolvable currency prices at `0`, which callers treat as unpriced.

use crate::domain::entities::{Instrument, InstrumentUpdate, Liquidation, RawLiquidation};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{CONTRACTS_CURRENCY, PriceQuantity, Symbol};
use std::collections::{HashMap, HashSet};

/// Index carrying the Bitcoin USD price.
pub const XBT_INDEX: &str = ".BXBT";

/// Index carrying the Tether USD price.
pub const USDT_INDEX: &str = ".BUSDT";

/// Sub-units per coin for the `XBt` and `USDt` settlement currencies.
const SUBUNITS_PER_COIN: f64 = 100_000_000.0;

/// Owning map from symbol to instrument.
#[derive(Debug, Clone, Default)]
pub struct InstrumentTable {
    instruments: HashMap<Symbol, Instrument>,
}

impl InstrumentTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table from a full snapshot.
    #[must_use]
    pub fn from_snapshot(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        let mut table = Self::new();
        table.load(instruments);
        table
    }

    /// Replaces the table wholesale.
    pub fn load(&mut self, instruments: impl IntoIterator<Item = Instrument>) {
        self.instruments = instruments
            .into_iter()
            .map(|inst| (inst.symbol.clone(), inst))
            .collect();
    }

    /// Applies a partial update.
    ///
    /// An unknown symbol is inserted as a new instrument built from the
    /// update itself.
    pub fn update(&mut self, update: InstrumentUpdate) {
        match self.instruments.get_mut(&update.symbol) {
            Some(existing) => existing.apply(update),
            None => {
                let instrument = Instrument::from(update);
                self.instruments.insert(instrument.symbol.clone(), instrument);
            }
        }
    }

    /// Looks up an instrument.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.get(symbol)
    }

    /// Number of known instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    /// Returns true if no instrument is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    fn index_mark(&self, symbol: &str) -> f64 {
        self.instruments.get(symbol).map_or(0.0, Instrument::mark)
    }

    /// USD price of the currencies with a fixed resolution rule.
    fn fixed_rate(&self, currency: &str) -> Option<f64> {
        let rate = match currency {
            "USD" => 1.0,
            "XBt" => self.index_mark(XBT_INDEX) / SUBUNITS_PER_COIN,
            "XBT" => self.index_mark(XBT_INDEX),
            "USDt" => self.index_mark(USDT_INDEX) / SUBUNITS_PER_COIN,
            "USDT" => self.index_mark(USDT_INDEX),
            _ => return None,
        };
        Some(rate)
    }

    /// Resolves a currency code to its USD price.
    ///
    /// Currencies without a fixed rule are priced by the USD-quoted price
    /// index on that underlying. When several indices match, the shortest
    /// symbol wins and equal lengths resolve to the lexicographically
    /// smallest symbol. Returns `0` when nothing matches.
    #[must_use]
    pub fn price_usd(&self, currency: &str) -> f64 {
        if let Some(rate) = self.fixed_rate(currency) {
            return finite_or_zero(rate);
        }

        self.instruments
            .values()
            .filter(|inst| {
                inst.instrument_type.is_price_index()
                    && inst.quote_currency.eq_ignore_ascii_case("USD")
                    && inst.underlying.to_uppercase() == currency
            })
            .filter_map(|inst| inst.mark_price.map(|mark| (inst.symbol.as_str(), mark)))
            .min_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .map_or(0.0, |(_, mark)| finite_or_zero(mark))
    }

    /// Resolves a symbol's quote currency to a USD multiplier.
    ///
    /// Follows the reference-symbol chain, multiplying mark prices, until a
    /// quote currency with a fixed rule is reached. An unknown symbol or a
    /// reference cycle of any length resolves to `0`.
    #[must_use]
    pub fn usd_lookup(&self, symbol: &str) -> f64 {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut factor = 1.0;
        let mut current = symbol;

        loop {
            if !visited.insert(current) {
                return 0.0;
            }
            let Some(inst) = self.instruments.get(current) else {
                return 0.0;
            };
            if let Some(rate) = self.fixed_rate(&inst.quote_currency) {
                return finite_or_zero(factor * rate);
            }
            factor *= inst.mark();
            current = inst.reference_symbol.as_str();
        }
    }

    /// Values a raw liquidation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InstrumentNotFound` if the symbol is unknown,
    /// or `DomainError::InvalidValue` if the price or quantity is not a
    /// positive finite number.
    pub fn process(&self, raw: &RawLiquidation) -> DomainResult<Liquidation> {
        if !(raw.price.is_finite() && raw.price > 0.0) {
            return Err(DomainError::invalid_value(format!(
                "{} price {}",
                raw.symbol, raw.price
            )));
        }
        if !(raw.leaves_qty.is_finite() && raw.leaves_qty > 0.0) {
            return Err(DomainError::invalid_value(format!(
                "{} quantity {}",
                raw.symbol, raw.leaves_qty
            )));
        }

        let inst = self
            .instruments
            .get(&raw.symbol)
            .ok_or_else(|| DomainError::instrument_not_found(raw.symbol.clone()))?;

        let currency = if inst.position_currency.is_empty() {
            CONTRACTS_CURRENCY.to_string()
        } else {
            inst.position_currency.clone()
        };

        let (quantity, usd_value) = if inst.is_inverse {
            (
                raw.leaves_qty,
                raw.leaves_qty * self.price_usd(&inst.position_currency),
            )
        } else if inst.is_quanto {
            (
                raw.leaves_qty,
                inst.notional_value() * raw.leaves_qty * self.price_usd(&inst.settle_currency),
            )
        } else {
            let notional = inst.notional_value();
            (
                raw.leaves_qty * notional,
                notional
                    * raw.leaves_qty
                    * self.usd_lookup(inst.reference_symbol.as_str())
                    * inst.mark(),
            )
        };

        let leg = PriceQuantity {
            price: raw.price,
            quantity: finite_or_zero(quantity),
            currency,
            total_usd_value: finite_or_zero(usd_value),
            min_step: inst.min_step(),
            min_tick: inst.tick(),
        };

        Ok(Liquidation::new(raw.symbol.clone(), raw.side, leg))
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{InstrumentType, Side};

    const FIXTURE: &str = include_str!("../../../tests/fixtures/instruments.json");

    fn table() -> InstrumentTable {
        let instruments: Vec<Instrument> = serde_json::from_str(FIXTURE).unwrap();
        InstrumentTable::from_snapshot(instruments)
    }

    fn raw(symbol: &str, price: f64, leaves_qty: f64) -> RawLiquidation {
        RawLiquidation {
            order_id: format!("{symbol}-order"),
            price,
            symbol: Symbol::new(symbol),
            leaves_qty,
            side: Side::Buy,
        }
    }

    fn index(symbol: &str, underlying: &str, mark: f64) -> Instrument {
        Instrument {
            symbol: Symbol::new(symbol),
            instrument_type: InstrumentType::FxIndex,
            quote_currency: "USD".to_string(),
            underlying: underlying.to_string(),
            mark_price: Some(mark),
            ..Instrument::default()
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }

    mod valuation {
        use super::*;

        #[test]
        fn linear_usdt_future() {
            let liq = table()
                .process(&raw("XBTUSDTU23", 22755.17, 1_000_000.0))
                .unwrap();
            assert_close(liq.leg.quantity, 1.0);
            assert_eq!(liq.leg.currency, "XBT");
            assert_close(liq.leg.total_usd_value, 22758.58);
            assert!((liq.leg.min_step - 0.001).abs() < 1e-12);
            assert_eq!(liq.leg.min_tick, 0.5);
        }

        #[test]
        fn linear_usdt_perpetual() {
            let liq = table().process(&raw("ETHUSDT", 1636.46, 29_000.0)).unwrap();
            assert_close(liq.leg.quantity, 0.29);
            assert_eq!(liq.leg.currency, "ETH");
            assert_close(liq.leg.total_usd_value, 474.64);
            assert_eq!(liq.leg.display_quantity(), "0.29");
        }

        #[test]
        fn linear_xbt_quoted_future() {
            let liq = table().process(&raw("ETHH23", 0.07221, 50_000.0)).unwrap();
            assert_close(liq.leg.quantity, 0.5);
            assert_close(liq.leg.total_usd_value, 821.58);
        }

        #[test]
        fn quanto_contract() {
            let liq = table().process(&raw("DOGEUSD", 0.08623, 2.0)).unwrap();
            assert_eq!(liq.leg.quantity, 2.0);
            assert_eq!(liq.leg.currency, CONTRACTS_CURRENCY);
            assert!((liq.leg.total_usd_value - 3.9243566).abs() < 1e-4);
            assert_eq!(liq.leg.min_step, 1.0);
        }

        #[test]
        fn quanto_eth_contract() {
            let liq = table().process(&raw("ETHUSD", 1592.55, 20.0)).unwrap();
            assert_close(liq.leg.total_usd_value, 724.77);
        }

        #[test]
        fn inverse_usd_contract() {
            let liq = table().process(&raw("XBTUSD", 23245.5, 1_000_000.0)).unwrap();
            assert_eq!(liq.leg.quantity, 1_000_000.0);
            assert_eq!(liq.leg.currency, "USD");
            assert_eq!(liq.leg.total_usd_value, 1_000_000.0);
            assert_eq!(liq.leg.min_step, 100.0);
        }

        #[test]
        fn inverse_foreign_currency_contract() {
            let liq = table().process(&raw("XBTEUR", 21400.5, 1_000_000.0)).unwrap();
            assert_eq!(liq.leg.currency, "EUR");
            assert_close(liq.leg.total_usd_value, 1_085_600.0);
        }

        #[test]
        fn unknown_symbol_is_rejected() {
            let err = table().process(&raw("NOPEUSD", 1.0, 1.0)).unwrap_err();
            assert!(err.is_instrument_not_found());
        }

        #[test]
        fn degenerate_quantities_are_rejected() {
            let cases = [(23_000.0, 0.0), (23_000.0, -5.0), (f64::NAN, 1.0), (0.0, 1.0)];
            for (price, qty) in cases {
                let err = table().process(&raw("XBTUSD", price, qty)).unwrap_err();
                assert!(err.is_invalid_value(), "{price} x {qty}");
            }
        }

        #[test]
        fn missing_index_prices_at_zero() {
            let without_xbt: Vec<Instrument> = serde_json::from_str::<Vec<Instrument>>(FIXTURE)
                .unwrap()
                .into_iter()
                .filter(|inst| inst.symbol.as_str() != XBT_INDEX)
                .collect();
            let table = InstrumentTable::from_snapshot(without_xbt);
            let liq = table.process(&raw("DOGEUSD", 0.08623, 2.0)).unwrap();
            assert_eq!(liq.leg.total_usd_value, 0.0);
        }
    }

    mod price_usd {
        use super::*;

        #[test]
        fn fixed_currencies() {
            let table = table();
            assert_eq!(table.price_usd("USD"), 1.0);
            assert_eq!(table.price_usd("XBT"), 22755.17);
            assert!((table.price_usd("XBt") - 0.0002275517).abs() < 1e-12);
            assert_eq!(table.price_usd("USDT"), 1.00015);
        }

        #[test]
        fn shortest_index_symbol_wins() {
            assert_eq!(table().price_usd("EUR"), 1.0856);
        }

        #[test]
        fn equal_lengths_resolve_lexicographically() {
            let table = InstrumentTable::from_snapshot([
                index(".BEUR", "EUR", 1.2),
                index(".AEUR", "EUR", 1.1),
                index(".CEUR", "EUR", 1.3),
            ]);
            assert_eq!(table.price_usd("EUR"), 1.1);
        }

        #[test]
        fn index_without_mark_is_skipped() {
            let mut unpriced = index(".AEUR", "EUR", 0.0);
            unpriced.mark_price = None;
            let table = InstrumentTable::from_snapshot([unpriced, index(".BEURX", "EUR", 1.2)]);
            assert_eq!(table.price_usd("EUR"), 1.2);
        }

        #[test]
        fn unknown_currency_prices_at_zero() {
            assert_eq!(table().price_usd("JPY"), 0.0);
        }
    }

    mod usd_lookup {
        use super::*;

        fn chained(symbol: &str, quote: &str, reference: &str, mark: f64) -> Instrument {
            Instrument {
                symbol: Symbol::new(symbol),
                quote_currency: quote.to_string(),
                reference_symbol: Symbol::new(reference),
                mark_price: Some(mark),
                ..Instrument::default()
            }
        }

        #[test]
        fn follows_reference_chain() {
            let table = InstrumentTable::from_snapshot([
                chained("A", "FOO", "B", 2.0),
                chained("B", "BAR", "C", 3.0),
                chained("C", "USD", "C", 100.0),
            ]);
            assert_eq!(table.usd_lookup("A"), 6.0);
        }

        #[test]
        fn self_reference_resolves_to_zero() {
            let table = InstrumentTable::from_snapshot([chained("A", "FOO", "A", 2.0)]);
            assert_eq!(table.usd_lookup("A"), 0.0);
        }

        #[test]
        fn longer_cycle_resolves_to_zero() {
            let table = InstrumentTable::from_snapshot([
                chained("A", "FOO", "B", 2.0),
                chained("B", "BAR", "C", 3.0),
                chained("C", "BAZ", "A", 4.0),
            ]);
            assert_eq!(table.usd_lookup("A"), 0.0);
        }

        #[test]
        fn unknown_symbol_resolves_to_zero() {
            assert_eq!(table().usd_lookup("NOPE"), 0.0);
        }
    }

    mod updates {
        use super::*;

        #[test]
        fn update_reprices_existing_instrument() {
            let mut table = table();
            table.update(InstrumentUpdate::mark_price(XBT_INDEX, 30_000.0));

            let liq = table.process(&raw("DOGEUSD", 0.08623, 2.0)).unwrap();
            assert!((liq.leg.total_usd_value - 17_246.0 * 0.0003).abs() < 1e-6);
            assert_eq!(table.get(XBT_INDEX).unwrap().tick(), 0.01);
        }

        #[test]
        fn update_for_unknown_symbol_inserts() {
            let mut table = InstrumentTable::new();
            table.update(InstrumentUpdate::mark_price("NEWUSD", 5.0));

            assert_eq!(table.len(), 1);
            assert_eq!(table.get("NEWUSD").unwrap().mark(), 5.0);
        }

        #[test]
        fn load_replaces_everything() {
            let mut table = table();
            table.load([index(".BEUR", "EUR", 1.0)]);
            assert_eq!(table.len(), 1);
            assert!(table.get("XBTUSD").is_none());
        }
    }
}
