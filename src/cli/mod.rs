//! Command-line interface
//!
//! Two commands: `run` starts one polling group and never returns,
//! `catalog` prints the resolved asset catalog for inspection.

pub mod catalog;
pub mod run;

use clap::{Parser, Subcommand, ValueEnum};

/// Market data capture daemon
#[derive(Parser)]
#[command(name = "market-capture", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a polling group
    Run(run::RunArgs),
    /// Print the resolved asset catalog
    Catalog(catalog::CatalogArgs),
}

/// Which polling group to operate on.
///
/// The two groups mirror the deployment layout: depth snapshots and the
/// futures index poll every few seconds, trades on a much longer cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Group {
    /// Order-book snapshots plus futures index values
    OrderBook,
    /// Trade prints
    Trades,
}
