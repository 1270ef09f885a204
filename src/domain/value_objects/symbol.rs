//! # Symbol Value Object
//!
//! Exchange-assigned trading symbol, used as a map key throughout the
//! pipeline. Symbols are case-sensitive and opaque.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A trading symbol such as `XBTUSD` or the index `.BXBT`.
///
/// # Examples
///
/// ```
/// use liquidation_herald::domain::value_objects::symbol::Symbol;
///
/// let symbol = Symbol::new("XBTUSD");
/// assert_eq!(symbol.as_str(), "XBTUSD");
/// assert_ne!(symbol, Symbol::new("xbtusd"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a symbol from any string-like value.
    #[must_use]
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// Returns the symbol text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the length of the symbol in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the symbol is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
