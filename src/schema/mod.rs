//! Canonical row types
//!
//! Everything a collector persists is normalized to the types in this
//! module before it touches the store.

mod market_data;

pub use market_data::{
    decimal_from_json, IndexValue, OrderBookLevel, Side, TradeRecord, MILLIS_TO_NANOS,
    NANOS_PER_SEC,
};
