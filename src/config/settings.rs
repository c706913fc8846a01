//! Application settings and configuration

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Database configuration
    pub database: DatabaseSettings,
    /// HTTP fetch configuration
    #[serde(default)]
    pub http: HttpSettings,
    /// Scheduler group configuration
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    /// Asset catalog inputs
    #[serde(default)]
    pub catalog: CatalogSettings,
}

/// Database connection settings
///
/// One logical store per data kind, mirroring the deployment where order
/// books, index values and trades live in separate databases. All three
/// URLs may point at the same database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// PostgreSQL URL for order-book tables
    pub order_book_url: String,
    /// PostgreSQL URL for futures-index tables
    pub index_url: String,
    /// PostgreSQL URL for trade tables
    pub trades_url: String,
    /// Maximum number of connections in each pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in each pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

/// HTTP fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
}

fn default_http_timeout() -> u64 {
    8
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
        }
    }
}

/// Scheduler settings for both polling groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Order-book group (depth snapshots + futures index)
    #[serde(default = "default_order_book_group")]
    pub order_book: GroupSettings,
    /// Trades group
    #[serde(default = "default_trades_group")]
    pub trades: GroupSettings,
}

/// Cadence of one polling group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSettings {
    /// Seconds between ticks; ticks are aligned to wall-clock multiples
    pub interval_secs: f64,
    /// Extra seconds slept past the aligned boundary so that several
    /// processes sharing an interval do not fire at the same instant
    pub offset_secs: f64,
}

fn default_order_book_group() -> GroupSettings {
    GroupSettings {
        interval_secs: 10.0,
        offset_secs: 0.001,
    }
}

fn default_trades_group() -> GroupSettings {
    GroupSettings {
        interval_secs: 100.0,
        offset_secs: 0.1,
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            order_book: default_order_book_group(),
            trades: default_trades_group(),
        }
    }
}

/// Inputs for building the asset catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Currencies to record, lower case (e.g. "btc")
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,
    /// Futures contracts to record
    #[serde(default = "default_contracts")]
    pub contracts: Vec<ContractSpec>,
    /// Contract used for the futures index endpoint
    #[serde(default = "default_index_contract")]
    pub index_contract: String,
    /// Base URL for spot instruments
    #[serde(default = "default_spot_base_url")]
    pub spot_base_url: String,
    /// Base URL for futures instruments
    #[serde(default = "default_futures_base_url")]
    pub futures_base_url: String,
    /// Depth requested for spot book snapshots
    #[serde(default = "default_spot_depth")]
    pub spot_depth: u32,
    /// Depth requested for futures book snapshots
    #[serde(default = "default_futures_depth")]
    pub futures_depth: u32,
    /// Number of trades requested per poll
    #[serde(default = "default_trade_batch")]
    pub trade_batch: u32,
}

/// One futures contract in the catalog.
///
/// `name` is the stable label used in table names; `code` is the
/// exchange-side instrument suffix (e.g. a delivery date) resolved
/// upstream and placed in endpoint URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractSpec {
    pub name: String,
    pub code: String,
}

fn default_currencies() -> Vec<String> {
    ["btc", "bch", "ltc", "etc", "eth"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_contracts() -> Vec<ContractSpec> {
    ["this_week", "next_week", "quarter"]
        .iter()
        .map(|name| ContractSpec {
            name: name.to_string(),
            code: name.to_string(),
        })
        .collect()
}

fn default_index_contract() -> String {
    "quarter".to_string()
}

fn default_spot_base_url() -> String {
    "https://www.okcoin.com/api/spot/v3/instruments".to_string()
}

fn default_futures_base_url() -> String {
    "https://www.okex.com/api/futures/v3/instruments".to_string()
}

fn default_spot_depth() -> u32 {
    500
}

fn default_futures_depth() -> u32 {
    200
}

fn default_trade_batch() -> u32 {
    200
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            currencies: default_currencies(),
            contracts: default_contracts(),
            index_contract: default_index_contract(),
            spot_base_url: default_spot_base_url(),
            futures_base_url: default_futures_base_url(),
            spot_depth: default_spot_depth(),
            futures_depth: default_futures_depth(),
            trade_batch: default_trade_batch(),
        }
    }
}

impl Settings {
    /// Load settings from configuration files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_prefix("MARKET_CAPTURE")
    }

    /// Load settings with a custom environment variable prefix
    pub fn load_with_prefix(env_prefix: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config_dir = Self::config_dir();

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Add environment-specific configuration
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Add local overrides (not checked into git)
            .add_source(File::with_name(&format!("{}/local", config_dir)).required(false))
            // Add environment variables (e.g., MARKET_CAPTURE__DATABASE__TRADES_URL)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Get the configuration directory path
    fn config_dir() -> String {
        std::env::var("MARKET_CAPTURE_CONFIG_DIR").unwrap_or_else(|_| "config".into())
    }

    /// Create default settings (useful for testing)
    pub fn default_settings() -> Self {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/market_capture".into());
        Settings {
            database: DatabaseSettings {
                order_book_url: url.clone(),
                index_url: url.clone(),
                trades_url: url,
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
            },
            http: HttpSettings::default(),
            scheduler: SchedulerSettings::default(),
            catalog: CatalogSettings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::default_settings()
    }
}
