//! Collectors
//!
//! A collector binds one [`AssetSource`] to its fetch → validate →
//! persist logic and is the sole writer to its sink table. The scheduler
//! only sees the [`Collector`] trait; the three implementations differ in
//! how they validate and transform the payload.
//!
//! Failure split: fetch and validation problems end the collector's tick
//! quietly (already logged), while storage errors propagate out of
//! `run_once` and are handled at the scheduler boundary.

mod index;
mod order_book;
mod trades;

pub use index::IndexCollector;
pub use order_book::OrderBookCollector;
pub use trades::TradesCollector;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{AssetSource, SourceKind};
use crate::fetch::SnapshotFetcher;
use crate::storage::{MarketStore, StorageError};

/// Errors escaping a collector's tick.
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One unit of scheduled work.
#[async_trait]
pub trait Collector: Send + Sync {
    /// The source this collector owns.
    fn source(&self) -> &AssetSource;

    /// Run one fetch-and-persist cycle.
    ///
    /// Returns `Ok(())` for everything the collector recovers from itself
    /// (failed fetch, rejected payload, bad trade rows); only storage
    /// errors come back as `Err`.
    async fn run_once(&self) -> Result<(), CollectorError>;
}

/// Build the collector matching the source's kind.
pub fn build_collector(
    source: AssetSource,
    fetcher: Arc<SnapshotFetcher>,
    store: Arc<dyn MarketStore>,
) -> Arc<dyn Collector> {
    match &source.kind {
        SourceKind::OrderBook => Arc::new(OrderBookCollector::new(source, fetcher, store)),
        SourceKind::Index { value_field } => {
            let value_field = value_field.clone();
            Arc::new(IndexCollector::new(source, value_field, fetcher, store))
        }
        SourceKind::Trades { id_field } => {
            let id_field = id_field.clone();
            Arc::new(TradesCollector::new(source, id_field, fetcher, store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogSettings;

    #[test]
    fn test_build_collector_dispatches_on_kind() {
        let cfg = CatalogSettings::default();
        let fetcher =
            Arc::new(SnapshotFetcher::new(std::time::Duration::from_secs(1)).unwrap());
        let store: Arc<dyn MarketStore> = Arc::new(crate::storage::MemoryStore::new());

        for source in crate::catalog::order_book_sources(&cfg)
            .into_iter()
            .chain(crate::catalog::trades_sources(&cfg))
        {
            let expected = source.sink_table.clone();
            let collector = build_collector(source, fetcher.clone(), store.clone());
            assert_eq!(collector.source().sink_table, expected);
        }
    }
}
