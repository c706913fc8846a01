//! `run` command: start a polling group

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::Group;
use crate::catalog::{order_book_sources, trades_sources, SourceKind};
use crate::collector::build_collector;
use crate::config::Settings;
use crate::fetch::SnapshotFetcher;
use crate::scheduler::Scheduler;
use crate::storage::{MarketStore, PostgresStore};

/// Arguments for `run`
#[derive(Args)]
pub struct RunArgs {
    /// Which polling group to start
    #[arg(long, value_enum)]
    pub group: Group,
}

/// Execute the run command. Only returns on a startup error; once the
/// scheduler is running the process lives until it is killed.
pub async fn execute(args: RunArgs) -> Result<()> {
    let settings = Settings::load().context("failed to load settings")?;

    let fetcher = Arc::new(
        SnapshotFetcher::new(Duration::from_secs(settings.http.timeout_secs))
            .context("failed to build HTTP client")?,
    );

    let scheduler = match args.group {
        Group::OrderBook => {
            let book_store: Arc<dyn MarketStore> = Arc::new(
                PostgresStore::connect(&settings.database.order_book_url, &settings.database)
                    .await
                    .context("failed to connect to the order-book store")?,
            );
            let index_store: Arc<dyn MarketStore> = Arc::new(
                PostgresStore::connect(&settings.database.index_url, &settings.database)
                    .await
                    .context("failed to connect to the index store")?,
            );

            let collectors = order_book_sources(&settings.catalog)
                .into_iter()
                .map(|source| {
                    let store = match source.kind {
                        SourceKind::Index { .. } => index_store.clone(),
                        _ => book_store.clone(),
                    };
                    build_collector(source, fetcher.clone(), store)
                })
                .collect();

            Scheduler::new(
                "order book and futures index",
                collectors,
                &settings.scheduler.order_book,
            )?
        }
        Group::Trades => {
            let trades_store: Arc<dyn MarketStore> = Arc::new(
                PostgresStore::connect(&settings.database.trades_url, &settings.database)
                    .await
                    .context("failed to connect to the trades store")?,
            );

            let collectors = trades_sources(&settings.catalog)
                .into_iter()
                .map(|source| build_collector(source, fetcher.clone(), trades_store.clone()))
                .collect();

            Scheduler::new("trades", collectors, &settings.scheduler.trades)?
        }
    };

    info!(
        "starting {:?} group with {} collectors",
        args.group,
        scheduler.collector_count()
    );
    scheduler.run().await;

    Ok(())
}
