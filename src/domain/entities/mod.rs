//! # Domain Entities
//!
//! Exchange records and the notification units built from them.
//!
//! ## Reference Data
//!
//! - [`Instrument`]: Contract metadata and live prices
//! - [`InstrumentUpdate`]: Partial instrument record
//!
//! ## Liquidations
//!
//! - [`RawLiquidation`]: Order as published by the exchange
//! - [`Liquidation`]: Valued liquidation
//! - [`CombinedLiquidation`]: Burst of liquidations announced together

pub mod instrument;
pub mod liquidation;

pub use instrument::{Instrument, InstrumentUpdate};
pub use liquidation::{
    CombinedLiquidation, Liquidation, MAX_COMBINED_POSITIONS, MAX_USD_VALUE_MERGEABLE,
    MERGE_BUCKETS, RawLiquidation, merge_bucket,
};
