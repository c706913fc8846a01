//! Persistence sinks
//!
//! Collectors write through the [`MarketStore`] trait so the scheduler and
//! collector logic never see a concrete driver. [`PostgresStore`] is the
//! production implementation; [`MemoryStore`] backs tests and dry runs.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::schema::{IndexValue, OrderBookLevel, TradeRecord};

/// Persistence errors.
///
/// These are the only errors that escape a collector's `run_once`; they
/// are caught and logged at the scheduler boundary.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid table name '{0}'")]
    InvalidTable(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Narrow persistence interface, one instance per data kind.
///
/// Implementations must scope any connection to the single call (acquire,
/// execute, release on every exit path) so that a connection dropped by
/// the server is replaced before the next call rather than poisoning it.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Bulk-append one order-book snapshot. No dedup; the batch lands
    /// atomically as one statement.
    async fn append_levels(&self, table: &str, rows: &[OrderBookLevel])
        -> Result<(), StorageError>;

    /// Append a single index observation. No dedup.
    async fn append_index(&self, table: &str, value: &IndexValue) -> Result<(), StorageError>;

    /// Whether a trade with this exchange id is already recorded.
    async fn trade_exists(&self, table: &str, trade_id: i64) -> Result<bool, StorageError>;

    /// Insert a trade, silently doing nothing if the id is already present.
    /// The write is committed before this returns.
    async fn insert_trade(&self, table: &str, trade: &TradeRecord) -> Result<(), StorageError>;
}

/// Validate a table identifier before it is interpolated into SQL.
///
/// Catalog tables are generated from configuration, so this is a guard
/// against a mistyped config value turning into arbitrary SQL.
pub(crate) fn validate_table(table: &str) -> Result<&str, StorageError> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(table)
    } else {
        Err(StorageError::InvalidTable(table.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table() {
        assert!(validate_table("trades_spot_btc").is_ok());
        assert!(validate_table("future_btc_usd_quarter_orderbook").is_ok());
        assert!(validate_table("_staging").is_ok());

        assert!(validate_table("").is_err());
        assert!(validate_table("1table").is_err());
        assert!(validate_table("Trades").is_err());
        assert!(validate_table("t; drop table t").is_err());
        assert!(validate_table("t-dash").is_err());
    }
}
