//! Order-book collector

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::{Collector, CollectorError};
use crate::book;
use crate::catalog::AssetSource;
use crate::fetch::SnapshotFetcher;
use crate::storage::MarketStore;

/// Records full depth snapshots for one instrument.
///
/// The payload is the raw book itself (no wrapper key). A book that fails
/// validation is logged together with the offending payload and the tick
/// is dropped; a valid book lands as a single bulk append tagged with the
/// request timestamp.
pub struct OrderBookCollector {
    source: AssetSource,
    fetcher: Arc<SnapshotFetcher>,
    store: Arc<dyn MarketStore>,
}

impl OrderBookCollector {
    pub fn new(
        source: AssetSource,
        fetcher: Arc<SnapshotFetcher>,
        store: Arc<dyn MarketStore>,
    ) -> Self {
        Self {
            source,
            fetcher,
            store,
        }
    }
}

#[async_trait]
impl Collector for OrderBookCollector {
    fn source(&self) -> &AssetSource {
        &self.source
    }

    async fn run_once(&self) -> Result<(), CollectorError> {
        let table = &self.source.sink_table;

        let result = self.fetcher.fetch(table, &self.source.endpoint_url).await;
        let Some(snapshot) = result.snapshot() else {
            return Ok(());
        };

        match book::normalize(snapshot.request_time_ns, &snapshot.payload) {
            Ok(rows) => {
                self.store.append_levels(table, &rows).await?;
            }
            Err(e) => {
                warn!("Error {}: {}: {}", table, e, snapshot.payload);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SourceKind;
    use crate::schema::Side;
    use crate::storage::MemoryStore;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(url: String) -> AssetSource {
        AssetSource {
            asset_id: "spot_btc".to_string(),
            endpoint_url: url,
            sink_table: "spot_btc_usd_orderbook".to_string(),
            kind: SourceKind::OrderBook,
        }
    }

    async fn collector_for(
        server: &MockServer,
        store: Arc<MemoryStore>,
        timeout: Duration,
    ) -> OrderBookCollector {
        let fetcher = Arc::new(SnapshotFetcher::new(timeout).unwrap());
        OrderBookCollector::new(source(server.uri()), fetcher, store)
    }

    #[tokio::test]
    async fn test_valid_book_is_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ask": [[100, 1], [101, 2]],
                "bid": [[99, 1], [98, 2]],
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let collector = collector_for(&server, store.clone(), Duration::from_secs(2)).await;

        collector.run_once().await.unwrap();

        let rows = store.levels("spot_btc_usd_orderbook");
        assert_eq!(rows.len(), 4);
        let best_ask = rows
            .iter()
            .find(|r| r.side == Side::Ask && r.level == 1)
            .unwrap();
        assert_eq!(best_ask.price, dec!(100));
        // Every row carries the same request timestamp.
        assert!(rows.iter().all(|r| r.timestamp_ns == rows[0].timestamp_ns));
    }

    #[tokio::test]
    async fn test_invalid_book_is_dropped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ask": [[100, 1]],
                "bid": [],
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let collector = collector_for(&server, store.clone(), Duration::from_secs(2)).await;

        collector.run_once().await.unwrap();
        assert!(store.levels("spot_btc_usd_orderbook").is_empty());
    }

    #[tokio::test]
    async fn test_fetch_timeout_ends_tick_quietly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ask": [[100, 1]], "bid": [[99, 1]]}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let collector = collector_for(&server, store.clone(), Duration::from_millis(50)).await;

        // No error escapes and nothing is written.
        collector.run_once().await.unwrap();
        assert!(store.levels("spot_btc_usd_orderbook").is_empty());
    }

    #[tokio::test]
    async fn test_storage_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ask": [[100, 1]],
                "bid": [[99, 1]],
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        store.set_unavailable("connection refused");
        let collector = collector_for(&server, store, Duration::from_secs(2)).await;

        assert!(collector.run_once().await.is_err());
    }
}
