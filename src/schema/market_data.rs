//! Normalized market data types
//!
//! These types are the canonical format for everything the daemon stores.
//! Exchange payloads are normalized to them before persistence, and the
//! column layouts in `sql/schema.sql` mirror their fields one to one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Nanoseconds per second, for wall-clock epoch conversion.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Conversion factor from exchange millisecond timestamps to nanoseconds.
pub const MILLIS_TO_NANOS: i64 = 1_000_000;

/// Order-book side.
///
/// The numeric values are the ones stored in the `side` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Ask,
    Bid,
}

impl Side {
    /// Numeric representation used in the database (ask = 1, bid = 2).
    pub fn as_i16(&self) -> i16 {
        match self {
            Side::Ask => 1,
            Side::Bid => 2,
        }
    }

    /// Parse an exchange side label. Labels are case-insensitive and both
    /// singular and plural forms are accepted ("ask", "asks", "Bid", ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "ask" | "asks" => Some(Side::Ask),
            "bid" | "bids" => Some(Side::Bid),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Ask => write!(f, "ask"),
            Side::Bid => write!(f, "bid"),
        }
    }
}

/// A single order-book level at a given depth rank.
///
/// For one `(timestamp_ns, side)` pair the `level` values form a contiguous
/// sequence starting at 1, ordered by proximity to the best price: level 1
/// is the lowest-priced ask or the highest-priced bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    /// Request time of the snapshot, nanoseconds since the Unix epoch.
    pub timestamp_ns: i64,
    /// Book side this level belongs to.
    pub side: Side,
    /// Depth rank, 1 = best price.
    pub level: i32,
    /// Price at this level.
    pub price: Decimal,
    /// Resting volume at this level.
    pub volume: Decimal,
}

/// A futures index observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexValue {
    /// When the request was issued, nanoseconds since the Unix epoch.
    pub request_time_ns: i64,
    /// When the parsed response came back.
    pub return_time_ns: i64,
    /// The index value reported by the exchange.
    pub value: Decimal,
}

/// A single trade print.
///
/// `trade_id` is the exchange-assigned identifier and is unique within the
/// sink table; the same trade observed by two overlapping polls is stored
/// once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// When the request was issued, nanoseconds since the Unix epoch.
    pub request_time_ns: i64,
    /// When the parsed response came back.
    pub return_time_ns: i64,
    /// Execution time reported by the exchange, converted from milliseconds.
    pub trade_time_ns: i64,
    /// Traded amount.
    pub amount: Decimal,
    /// Traded price.
    pub price: Decimal,
    /// Taker side as reported by the exchange ("buy"/"sell").
    pub side: String,
    /// Exchange-assigned trade identifier.
    pub trade_id: i64,
}

impl TradeRecord {
    /// Convert an exchange millisecond timestamp to nanoseconds.
    pub fn trade_time_from_millis(millis: i64) -> i64 {
        millis * MILLIS_TO_NANOS
    }
}

/// Convert a JSON scalar to a decimal.
///
/// Exchanges send numeric fields either as JSON numbers or as strings;
/// both go through their string form so decimal precision stays exact.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
