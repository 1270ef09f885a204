//! # Value Objects
//!
//! Immutable types with domain semantics.
//!
//! ## Identity Types
//!
//! - [`Symbol`]: Exchange-assigned trading symbol
//!
//! ## Valuation
//!
//! - [`PriceQuantity`]: A valued liquidation leg and its rendering rules
//!
//! ## Time
//!
//! - [`Timestamp`]: UTC instant
//! - [`CalendarMarkers`]: Day / ISO week / month position used for rollover
//!
//! ## Domain Enums
//!
//! - [`Side`]: Buy or Sell
//! - [`InstrumentType`]: Exchange classification code

pub mod enums;
pub mod price_quantity;
pub mod symbol;
pub mod timestamp;

pub use enums::{InstrumentType, Side};
pub use price_quantity::{CONTRACTS_CURRENCY, PriceQuantity, display_tick, display_usd};
pub use symbol::Symbol;
pub use timestamp::{CalendarMarkers, Timestamp};
