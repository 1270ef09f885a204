//! # Price / Quantity Value Object
//!
//! A valued liquidation leg: price, display quantity, currency label and USD
//! value, plus the instrument increments used to render it.
//!
//! Rendering follows the exchange's own precision: quantities are shown with
//! as many decimals as the minimum step has, prices with as many as the tick
//! size has. Extra digits are truncated, never rounded.

use serde::{Deserialize, Serialize};

/// Currency label used when an instrument has no position currency.
pub const CONTRACTS_CURRENCY: &str = "Cont";

/// A valued liquidation leg.
///
/// Immutable once computed by the instrument table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuantity {
    /// Order price.
    pub price: f64,
    /// Quantity in display units (contracts, coins or USD).
    pub quantity: f64,
    /// Display currency of `quantity`.
    pub currency: String,
    /// USD value of the leg; `0` when it could not be priced.
    pub total_usd_value: f64,
    /// Minimum quantity increment, used for quantity rendering.
    pub min_step: f64,
    /// Minimum price increment, used for price rendering.
    pub min_tick: f64,
}

impl PriceQuantity {
    /// Renders the price with the instrument's tick size.
    #[must_use]
    pub fn display_price(&self) -> String {
        display_tick(self.price, self.min_tick)
    }

    /// Renders the quantity with the instrument's minimum step.
    #[must_use]
    pub fn display_quantity(&self) -> String {
        display_tick(self.quantity, self.min_step)
    }

    /// Returns true when the quantity is already expressed in US dollars.
    #[must_use]
    pub fn is_usd_denominated(&self) -> bool {
        is_usd_currency(&self.currency)
    }
}

/// Returns true for the currency labels that already read as dollars.
#[must_use]
pub fn is_usd_currency(currency: &str) -> bool {
    matches!(currency, "USD" | "USDT")
}

/// Renders `value` at the precision implied by `increment`.
///
/// - unknown increment (`0`): shortest representation
/// - sub-unit increment: `-floor(log10(increment))` decimals
/// - unit or larger increment: integer part only
///
/// # Examples
///
/// ```
/// use liquidation_herald::domain::value_objects::price_quantity::display_tick;
///
/// assert_eq!(display_tick(23245.5, 0.5), "23,245.5");
/// assert_eq!(display_tick(1_000_000.0, 100.0), "1,000,000");
/// assert_eq!(display_tick(0.08623, 0.00001), "0.08623");
/// assert_eq!(display_tick(0.123456, 0.01), "0.12");
/// ```
#[must_use]
pub fn display_tick(value: f64, increment: f64) -> String {
    if increment == 0.0 || !increment.is_finite() {
        return format_grouped(value, None);
    }

    let magnitude = increment.abs().log10();
    if magnitude < 0.0 {
        let decimals = (-magnitude.floor()) as usize;
        return format_grouped(value, Some(decimals));
    }

    format_grouped(value.trunc(), Some(0))
}

/// Renders a USD amount with two decimals when it has a fractional part.
///
/// # Examples
///
/// ```
/// use liquidation_herald::domain::value_objects::price_quantity::display_usd;
///
/// assert_eq!(display_usd(1_085_600.0), "1,085,600");
/// assert_eq!(display_usd(724.7749196699999), "724.77");
/// assert_eq!(display_usd(3.9), "3.90");
/// ```
#[must_use]
pub fn display_usd(value: f64) -> String {
    let mut rendered = format_grouped(value, Some(2));
    if rendered.find('.').is_some_and(|idx| rendered.len() - idx == 2) {
        rendered.push('0');
    }
    rendered
}

/// Formats a number with comma-grouped thousands.
///
/// Starts from the shortest round-trip representation and truncates the
/// fractional part to `max_decimals` digits when given. A fractional part
/// truncated to nothing is dropped along with its point.
#[must_use]
pub fn format_grouped(value: f64, max_decimals: Option<usize>) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    let repr = value.to_string();
    let (sign, unsigned) = match repr.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", repr.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };
    let fraction = match max_decimals {
        Some(max) => fraction.get(..max.min(fraction.len())).unwrap_or(fraction),
        None => fraction,
    };

    let mut out = String::with_capacity(repr.len() + integer.len() / 3 + 1);
    out.push_str(sign);
    let digits = integer.len();
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leg(price: f64, quantity: f64, min_step: f64, min_tick: f64) -> PriceQuantity {
        PriceQuantity {
            price,
            quantity,
            currency: "XBT".to_string(),
            total_usd_value: 0.0,
            min_step,
            min_tick,
        }
    }

    mod grouping {
        use super::*;

        #[test]
        fn groups_thousands() {
            assert_eq!(format_grouped(1234567.0, None), "1,234,567");
            assert_eq!(format_grouped(999.0, None), "999");
            assert_eq!(format_grouped(1000.0, None), "1,000");
            assert_eq!(format_grouped(-1234.5, None), "-1,234.5");
        }

        #[test]
        fn truncates_instead_of_rounding() {
            assert_eq!(format_grouped(1.999, Some(2)), "1.99");
            assert_eq!(format_grouped(2.5, Some(0)), "2");
        }

        #[test]
        fn keeps_short_fractions_unpadded() {
            assert_eq!(format_grouped(0.5, Some(3)), "0.5");
        }
    }

    mod rendering {
        use super::*;

        #[test]
        fn quantity_uses_min_step() {
            let pq = leg(22755.17, 0.29000000000000004, 0.01, 0.05);
            assert_eq!(pq.display_quantity(), "0.29");
        }

        #[test]
        fn price_uses_tick_size() {
            let pq = leg(22755.17, 1.0, 0.001, 0.5);
            assert_eq!(pq.display_price(), "22,755.1");
        }

        #[test]
        fn unknown_increment_uses_shortest_repr() {
            let pq = leg(1636.46, 3.0, 0.0, 0.0);
            assert_eq!(pq.display_price(), "1,636.46");
            assert_eq!(pq.display_quantity(), "3");
        }

        #[test]
        fn usd_pads_single_decimal() {
            assert_eq!(display_usd(22758.5), "22,758.50");
            assert_eq!(display_usd(22758.5832755), "22,758.58");
        }

        #[test]
        fn usd_denominated_currencies() {
            assert!(is_usd_currency("USD"));
            assert!(is_usd_currency("USDT"));
            assert!(!is_usd_currency("USDt"));
            assert!(!is_usd_currency(CONTRACTS_CURRENCY));
        }
    }

    proptest! {
        #[test]
        fn grouping_preserves_integer_digits(value in 0u64..10_000_000_000_000) {
            let rendered = format_grouped(value as f64, Some(0));
            prop_assert_eq!(rendered.replace(',', ""), value.to_string());
        }

        #[test]
        fn grouped_chunks_have_three_digits(value in 0u64..10_000_000_000_000) {
            let rendered = format_grouped(value as f64, Some(0));
            for chunk in rendered.split(',').skip(1) {
                prop_assert_eq!(chunk.len(), 3);
            }
        }
    }
}
