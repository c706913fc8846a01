//! Market Capture CLI
//!
//! Provides commands for:
//! - `run`: start a polling group (order-book or trades)
//! - `catalog`: print the resolved asset catalog

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use market_capture::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("market_capture=info".parse()?))
        .init();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Execute command
    match cli.command {
        Commands::Run(args) => {
            market_capture::cli::run::execute(args).await?;
        }
        Commands::Catalog(args) => {
            market_capture::cli::catalog::execute(args).await?;
        }
    }

    Ok(())
}
