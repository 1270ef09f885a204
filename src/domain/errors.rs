//! # Domain Errors
//!
//! Error types for business rule violations in the valuation and combining
//! logic.

use crate::domain::value_objects::{Side, Symbol};
use thiserror::Error;

/// Domain layer error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// The liquidation references a symbol missing from the instrument table.
    #[error("instrument not found: {0}")]
    InstrumentNotFound(Symbol),

    /// A liquidation was offered to a combined liquidation it cannot join.
    #[error("cannot combine {incoming_side} {incoming_symbol} into {side} {symbol}")]
    CannotCombine {
        /// Symbol of the pending combined liquidation.
        symbol: Symbol,
        /// Side of the pending combined liquidation.
        side: Side,
        /// Symbol of the rejected liquidation.
        incoming_symbol: Symbol,
        /// Side of the rejected liquidation.
        incoming_side: Side,
    },

    /// A value failed validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl DomainError {
    /// Creates an instrument not found error.
    #[must_use]
    pub fn instrument_not_found(symbol: impl Into<Symbol>) -> Self {
        Self::InstrumentNotFound(symbol.into())
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }

    /// Returns true if this is an unknown-instrument error.
    #[must_use]
    pub fn is_instrument_not_found(&self) -> bool {
        matches!(self, Self::InstrumentNotFound(_))
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub fn is_invalid_value(&self) -> bool {
        matches!(self, Self::InvalidValue(_))
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
