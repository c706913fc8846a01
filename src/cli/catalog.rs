//! `catalog` command: print the resolved asset catalog

use anyhow::{Context, Result};
use clap::Args;

use super::Group;
use crate::catalog::{order_book_sources, trades_sources};
use crate::config::Settings;

/// Arguments for `catalog`
#[derive(Args)]
pub struct CatalogArgs {
    /// Which polling group to print
    #[arg(long, value_enum)]
    pub group: Group,
}

pub async fn execute(args: CatalogArgs) -> Result<()> {
    let settings = Settings::load().context("failed to load settings")?;

    let sources = match args.group {
        Group::OrderBook => order_book_sources(&settings.catalog),
        Group::Trades => trades_sources(&settings.catalog),
    };

    for source in &sources {
        println!(
            "{:<28} {:<36} {}",
            source.asset_id, source.sink_table, source.endpoint_url
        );
    }
    println!("{} sources", sources.len());

    Ok(())
}
