//! # Domain Enums
//!
//! Enumeration types for domain concepts.
//!
//! - [`Side`] - Buy or Sell side of a liquidation order
//! - [`InstrumentType`] - Exchange classification code of an instrument
//!
//! Both decode from the exchange's JSON spellings through serde.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a liquidation order.
///
/// The exchange liquidates a short position with a Buy order and a long
/// position with a Sell order.
///
/// # Examples
///
/// ```
/// use liquidation_herald::domain::value_objects::enums::Side;
///
/// assert_eq!(Side::Buy.liquidated_position(), "short");
/// assert_eq!(Side::Sell.to_string(), "Sell");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy order, closing a short position.
    #[serde(alias = "BUY", alias = "buy")]
    Buy = 0,
    /// Sell order, closing a long position.
    #[serde(alias = "SELL", alias = "sell")]
    Sell = 1,
}

impl Side {
    /// Returns the kind of position this order liquidates.
    #[inline]
    #[must_use]
    pub const fn liquidated_position(self) -> &'static str {
        match self {
            Self::Buy => "short",
            Self::Sell => "long",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy"),
            Self::Sell => write!(f, "Sell"),
        }
    }
}

/// Exchange instrument classification (CFI-like code).
///
/// Only the index types matter for valuation: they carry the USD prices
/// used to convert foreign currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InstrumentType {
    /// Perpetual contract.
    #[serde(rename = "FFWCSX")]
    PerpetualContract,
    /// Perpetual contract on an FX underlier.
    #[serde(rename = "FFWCSF")]
    PerpetualContractFx,
    /// Spot pair.
    #[serde(rename = "IFXXXP")]
    Spot,
    /// Dated future.
    #[serde(rename = "FFCCSX")]
    Future,
    /// Basket index.
    #[serde(rename = "MRBXXX")]
    BasketIndex,
    /// Crypto index.
    #[serde(rename = "MRCXXX")]
    CryptoIndex,
    /// FX index.
    #[serde(rename = "MRFXXX")]
    FxIndex,
    /// Premium (funding) index.
    #[serde(rename = "MRRXXX")]
    PremiumIndex,
    /// Volatility index.
    #[serde(rename = "MRIXXX")]
    VolatilityIndex,
    /// Any code this crate does not model.
    #[default]
    #[serde(other)]
    Other,
}

impl InstrumentType {
    /// Returns true for the index types that quote a currency's USD price.
    #[inline]
    #[must_use]
    pub const fn is_price_index(self) -> bool {
        matches!(self, Self::BasketIndex | Self::CryptoIndex | Self::FxIndex)
    }

    /// Returns the exchange code of this type.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PerpetualContract => "FFWCSX",
            Self::PerpetualContractFx => "FFWCSF",
            Self::Spot => "IFXXXP",
            Self::Future => "FFCCSX",
            Self::BasketIndex => "MRBXXX",
            Self::CryptoIndex => "MRCXXX",
            Self::FxIndex => "MRFXXX",
            Self::PremiumIndex => "MRRXXX",
            Self::VolatilityIndex => "MRIXXX",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn side_deserializes_exchange_spellings() {
        let side: Side = serde_json::from_str("\"Buy\"").unwrap();
        assert_eq!(side, Side::Buy);
        let side: Side = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(side, Side::Sell);
        assert!(serde_json::from_str::<Side>("\"hold\"").is_err());
    }

    #[test]
    fn unknown_instrument_type_maps_to_other() {
        let typ: InstrumentType = serde_json::from_str("\"OCECCS\"").unwrap();
        assert_eq!(typ, InstrumentType::Other);
        let typ: InstrumentType = serde_json::from_str("\"MRCXXX\"").unwrap();
        assert!(typ.is_price_index());
    }

    #[test]
    fn premium_index_is_not_a_price_index() {
        assert!(!InstrumentType::PremiumIndex.is_price_index());
        assert_eq!(InstrumentType::PremiumIndex.to_string(), "MRRXXX");
    }
}
