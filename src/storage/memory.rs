//! In-memory market store
//!
//! Backs unit tests and `--dry-run` wiring. Behavior mirrors the
//! PostgreSQL store where it matters: table names are validated, trade
//! inserts are no-ops on a duplicate id, appends never deduplicate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{validate_table, MarketStore, StorageError};
use crate::schema::{IndexValue, OrderBookLevel, TradeRecord};

#[derive(Default)]
struct Tables {
    levels: HashMap<String, Vec<OrderBookLevel>>,
    index: HashMap<String, Vec<IndexValue>>,
    trades: HashMap<String, Vec<TradeRecord>>,
}

/// Market store keeping everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    /// When set, every write and lookup fails as if the store were down.
    fail: Mutex<Option<String>>,
    /// Number of trade insert statements issued (including duplicates).
    insert_attempts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make all subsequent calls fail with `reason`, emulating an
    /// unreachable database.
    pub fn set_unavailable(&self, reason: &str) {
        *self.fail.lock().unwrap() = Some(reason.to_string());
    }

    /// Clear a previous [`MemoryStore::set_unavailable`].
    pub fn set_available(&self) {
        *self.fail.lock().unwrap() = None;
    }

    /// Recorded order-book rows for a table.
    pub fn levels(&self, table: &str) -> Vec<OrderBookLevel> {
        self.tables
            .lock()
            .unwrap()
            .levels
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Recorded index observations for a table.
    pub fn index_values(&self, table: &str) -> Vec<IndexValue> {
        self.tables
            .lock()
            .unwrap()
            .index
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// How many trade inserts have been issued, duplicates included.
    pub fn insert_attempts(&self) -> usize {
        self.insert_attempts.load(Ordering::Relaxed)
    }

    /// Recorded trades for a table.
    pub fn trades(&self, table: &str) -> Vec<TradeRecord> {
        self.tables
            .lock()
            .unwrap()
            .trades
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        match self.fail.lock().unwrap().as_ref() {
            Some(reason) => Err(StorageError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn append_levels(
        &self,
        table: &str,
        rows: &[OrderBookLevel],
    ) -> Result<(), StorageError> {
        let table = validate_table(table)?;
        self.check_available()?;

        self.tables
            .lock()
            .unwrap()
            .levels
            .entry(table.to_string())
            .or_default()
            .extend_from_slice(rows);
        Ok(())
    }

    async fn append_index(&self, table: &str, value: &IndexValue) -> Result<(), StorageError> {
        let table = validate_table(table)?;
        self.check_available()?;

        self.tables
            .lock()
            .unwrap()
            .index
            .entry(table.to_string())
            .or_default()
            .push(value.clone());
        Ok(())
    }

    async fn trade_exists(&self, table: &str, trade_id: i64) -> Result<bool, StorageError> {
        let table = validate_table(table)?;
        self.check_available()?;

        Ok(self
            .tables
            .lock()
            .unwrap()
            .trades
            .get(table)
            .map(|rows| rows.iter().any(|t| t.trade_id == trade_id))
            .unwrap_or(false))
    }

    async fn insert_trade(&self, table: &str, trade: &TradeRecord) -> Result<(), StorageError> {
        let table = validate_table(table)?;
        self.check_available()?;
        self.insert_attempts.fetch_add(1, Ordering::Relaxed);

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.trades.entry(table.to_string()).or_default();
        if rows.iter().any(|t| t.trade_id == trade.trade_id) {
            return Ok(());
        }
        rows.push(trade.clone());
        Ok(())
    }
}
