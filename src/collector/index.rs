//! Futures-index collector

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::{Collector, CollectorError};
use crate::catalog::AssetSource;
use crate::fetch::SnapshotFetcher;
use crate::schema::{decimal_from_json, IndexValue};
use crate::storage::MarketStore;

/// Records a futures index value on every successful poll.
///
/// The payload must carry the configured value field; which key that is
/// ("index", "future_index", ...) depends on the endpoint family and comes
/// from the catalog. There is no dedup: every structurally valid response
/// appends one row.
pub struct IndexCollector {
    source: AssetSource,
    value_field: String,
    fetcher: Arc<SnapshotFetcher>,
    store: Arc<dyn MarketStore>,
}

impl IndexCollector {
    pub fn new(
        source: AssetSource,
        value_field: String,
        fetcher: Arc<SnapshotFetcher>,
        store: Arc<dyn MarketStore>,
    ) -> Self {
        Self {
            source,
            value_field,
            fetcher,
            store,
        }
    }
}

#[async_trait]
impl Collector for IndexCollector {
    fn source(&self) -> &AssetSource {
        &self.source
    }

    async fn run_once(&self) -> Result<(), CollectorError> {
        let table = &self.source.sink_table;

        let result = self.fetcher.fetch(table, &self.source.endpoint_url).await;
        let Some(snapshot) = result.snapshot() else {
            return Ok(());
        };

        let Some(raw) = snapshot.payload.get(&self.value_field) else {
            warn!(
                "Error {}: missing '{}': {}",
                table, self.value_field, snapshot.payload
            );
            return Ok(());
        };

        let Some(value) = decimal_from_json(raw) else {
            warn!(
                "Error {}: '{}' is not numeric: {}",
                table, self.value_field, snapshot.payload
            );
            return Ok(());
        };

        self.store
            .append_index(
                table,
                &IndexValue {
                    request_time_ns: snapshot.request_time_ns,
                    return_time_ns: snapshot.return_time_ns,
                    value,
                },
            )
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SourceKind;
    use crate::storage::MemoryStore;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(url: String) -> AssetSource {
        AssetSource {
            asset_id: "index_btc".to_string(),
            endpoint_url: url,
            sink_table: "future_index_btc_usd".to_string(),
            kind: SourceKind::Index {
                value_field: "future_index".to_string(),
            },
        }
    }

    async fn run(server: &MockServer, store: Arc<MemoryStore>) {
        let fetcher = Arc::new(SnapshotFetcher::new(Duration::from_secs(2)).unwrap());
        let collector =
            IndexCollector::new(source(server.uri()), "future_index".to_string(), fetcher, store);
        collector.run_once().await.unwrap();
    }

    #[tokio::test]
    async fn test_index_value_is_appended() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "future_index": 6521.37,
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        run(&server, store.clone()).await;

        let values = store.index_values("future_index_btc_usd");
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value, dec!(6521.37));
        assert!(values[0].return_time_ns >= values[0].request_time_ns);
    }

    #[tokio::test]
    async fn test_string_index_value_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "future_index": "6521.37",
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        run(&server, store.clone()).await;

        assert_eq!(
            store.index_values("future_index_btc_usd")[0].value,
            dec!(6521.37)
        );
    }

    #[tokio::test]
    async fn test_missing_field_drops_tick() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "index": 6521.37,
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        run(&server, store.clone()).await;

        assert!(store.index_values("future_index_btc_usd").is_empty());
    }

    #[tokio::test]
    async fn test_no_dedup_across_ticks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "future_index": 6521.37,
            })))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        run(&server, store.clone()).await;
        run(&server, store.clone()).await;

        assert_eq!(store.index_values("future_index_btc_usd").len(), 2);
    }
}
