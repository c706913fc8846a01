//! Trades collector

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{Collector, CollectorError};
use crate::catalog::AssetSource;
use crate::fetch::SnapshotFetcher;
use crate::schema::TradeRecord;
use crate::storage::MarketStore;

/// One trade object as the exchange sends it.
///
/// Field names vary by endpoint generation: the amount arrives as
/// `amount`, `size` or `qty`, and the side as `side` or `type`. The trade
/// id is looked up separately under the catalog-configured key.
#[derive(Debug, Deserialize)]
struct RawTrade {
    /// Execution time in milliseconds since the Unix epoch.
    date_ms: i64,
    #[serde(alias = "size", alias = "qty")]
    amount: Decimal,
    price: Decimal,
    #[serde(alias = "type")]
    side: String,
}

/// Records trade prints, deduplicated by exchange trade id.
///
/// Polls overlap on purpose (each poll asks for the last N trades), so
/// most rows of a batch are usually already recorded. A malformed row is
/// logged and skipped without aborting the rest of the batch.
pub struct TradesCollector {
    source: AssetSource,
    id_field: String,
    fetcher: Arc<SnapshotFetcher>,
    store: Arc<dyn MarketStore>,
}

impl TradesCollector {
    pub fn new(
        source: AssetSource,
        id_field: String,
        fetcher: Arc<SnapshotFetcher>,
        store: Arc<dyn MarketStore>,
    ) -> Self {
        Self {
            source,
            id_field,
            fetcher,
            store,
        }
    }

    /// Extract the trade id under the configured key.
    fn trade_id(&self, row: &Value) -> Option<i64> {
        row.get(&self.id_field).and_then(Value::as_i64)
    }
}

#[async_trait]
impl Collector for TradesCollector {
    fn source(&self) -> &AssetSource {
        &self.source
    }

    async fn run_once(&self) -> Result<(), CollectorError> {
        let table = &self.source.sink_table;

        let result = self.fetcher.fetch(table, &self.source.endpoint_url).await;
        let Some(snapshot) = result.snapshot() else {
            return Ok(());
        };

        let Some(rows) = snapshot.payload.as_array() else {
            warn!("Error {}: payload is not a list: {}", table, snapshot.payload);
            return Ok(());
        };

        for row in rows {
            let Some(trade_id) = self.trade_id(row) else {
                warn!("Error no {}: {}", self.id_field, row);
                continue;
            };

            if self.store.trade_exists(table, trade_id).await? {
                continue;
            }

            let raw: RawTrade = match serde_json::from_value(row.clone()) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Error {}: bad trade row {}: {}", table, row, e);
                    continue;
                }
            };

            let record = TradeRecord {
                request_time_ns: snapshot.request_time_ns,
                return_time_ns: snapshot.return_time_ns,
                trade_time_ns: TradeRecord::trade_time_from_millis(raw.date_ms),
                amount: raw.amount,
                price: raw.price,
                side: raw.side,
                trade_id,
            };

            self.store.insert_trade(table, &record).await?;
        }

        Ok(())
    }
}
