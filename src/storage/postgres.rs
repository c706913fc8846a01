//! PostgreSQL market store

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::debug;

use super::{validate_table, MarketStore, StorageError};
use crate::config::DatabaseSettings;
use crate::schema::{IndexValue, OrderBookLevel, TradeRecord};

/// PostgreSQL implementation of [`MarketStore`].
///
/// Connections are pooled; every call checks one out, executes a single
/// auto-committed statement and returns it. A connection the server closed
/// between ticks is discarded by the pool and replaced on demand, so one
/// broken call cannot corrupt the next.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a store from an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `url` with the pool limits from settings.
    pub async fn connect(url: &str, settings: &DatabaseSettings) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(url)
            .await?;

        Ok(Self::new(pool))
    }

    /// Get the database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MarketStore for PostgresStore {
    async fn append_levels(
        &self,
        table: &str,
        rows: &[OrderBookLevel],
    ) -> Result<(), StorageError> {
        let table = validate_table(table)?;
        if rows.is_empty() {
            return Ok(());
        }

        // One multi-row statement per snapshot: either every level lands
        // or none do.
        let mut query = format!(
            "INSERT INTO {} (timestamp, side, level, price, volume) VALUES ",
            table
        );

        let mut param = 1;
        for i in 0..rows.len() {
            if i > 0 {
                query.push_str(", ");
            }
            query.push_str(&format!(
                "(${}, ${}, ${}, ${}, ${})",
                param,
                param + 1,
                param + 2,
                param + 3,
                param + 4,
            ));
            param += 5;
        }

        let mut sqlx_query = sqlx::query(&query);
        for row in rows {
            sqlx_query = sqlx_query
                .bind(row.timestamp_ns)
                .bind(row.side.as_i16())
                .bind(row.level)
                .bind(row.price)
                .bind(row.volume);
        }

        sqlx_query.execute(&self.pool).await?;
        debug!("appended {} levels to {}", rows.len(), table);
        Ok(())
    }

    async fn append_index(&self, table: &str, value: &IndexValue) -> Result<(), StorageError> {
        let table = validate_table(table)?;

        let query = format!(
            "INSERT INTO {} (request_time, return_time, value) VALUES ($1, $2, $3)",
            table
        );

        sqlx::query(&query)
            .bind(value.request_time_ns)
            .bind(value.return_time_ns)
            .bind(value.value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn trade_exists(&self, table: &str, trade_id: i64) -> Result<bool, StorageError> {
        let table = validate_table(table)?;

        let query = format!("SELECT COUNT(*) AS n FROM {} WHERE tid = $1", table);
        let row = sqlx::query(&query)
            .bind(trade_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("n") > 0)
    }

    async fn insert_trade(&self, table: &str, trade: &TradeRecord) -> Result<(), StorageError> {
        let table = validate_table(table)?;

        // ON CONFLICT DO NOTHING covers the race between the existence
        // check and this insert when two polls overlap.
        let query = format!(
            "INSERT INTO {} (request_time, return_time, trade_time, amount, price, side, tid) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) ON CONFLICT (tid) DO NOTHING",
            table
        );

        sqlx::query(&query)
            .bind(trade.request_time_ns)
            .bind(trade.return_time_ns)
            .bind(trade.trade_time_ns)
            .bind(trade.amount)
            .bind(trade.price)
            .bind(&trade.side)
            .bind(trade.trade_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
