//! Asset catalog
//!
//! Builds the ordered collection of [`AssetSource`] descriptors that the
//! scheduler groups poll. Construction is explicit: callers get the
//! catalog from [`order_book_sources`] / [`trades_sources`] and wire it
//! into collectors themselves, so the set of active sources is a plain
//! parameter with no import-time side effects.

use serde::{Deserialize, Serialize};

use crate::config::CatalogSettings;

/// What kind of data an endpoint serves, plus the kind-specific
/// field-extraction keys.
///
/// The key names are configuration data rather than collector subclass
/// behavior: endpoint families disagree on what the index value or the
/// trade identifier is called, and the catalog resolves that per source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// Full order-book depth snapshot; the payload is the raw book itself.
    OrderBook,
    /// Futures index value found under `value_field` in the payload.
    Index { value_field: String },
    /// Array of trade objects, identified by the `id_field` key.
    Trades { id_field: String },
}

impl SourceKind {
    /// Short label used in log messages.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::OrderBook => "order_book",
            SourceKind::Index { .. } => "index",
            SourceKind::Trades { .. } => "trades",
        }
    }
}

/// One unit of collection: an asset, the endpoint that serves it and the
/// table its rows land in. Immutable after construction; exactly one
/// collector is built per source and is its sole writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSource {
    /// Stable asset identifier (e.g. "spot_btc", "future_eth_quarter")
    pub asset_id: String,
    /// Full request URL including query parameters
    pub endpoint_url: String,
    /// Destination table
    pub sink_table: String,
    /// Data kind served by the endpoint
    pub kind: SourceKind,
}

/// Field under which the futures index endpoints report their value.
const INDEX_VALUE_FIELD: &str = "future_index";

/// Field under which both trade endpoint generations report the trade id.
const TRADE_ID_FIELD: &str = "tid";

/// Build the order-book group: spot depth, futures index and futures depth
/// per configured currency.
pub fn order_book_sources(cfg: &CatalogSettings) -> Vec<AssetSource> {
    let mut sources = Vec::new();

    let index_code = cfg
        .contracts
        .iter()
        .find(|c| c.name == cfg.index_contract)
        .map(|c| c.code.as_str())
        .unwrap_or(cfg.index_contract.as_str());

    for currency in &cfg.currencies {
        let cur = currency.to_uppercase();

        sources.push(AssetSource {
            asset_id: format!("spot_{currency}"),
            endpoint_url: format!(
                "{}/{cur}-USD/book?size={}",
                cfg.spot_base_url, cfg.spot_depth
            ),
            sink_table: format!("spot_{currency}_usd_orderbook"),
            kind: SourceKind::OrderBook,
        });

        sources.push(AssetSource {
            asset_id: format!("index_{currency}"),
            endpoint_url: format!("{}/{cur}-USD-{index_code}/index", cfg.futures_base_url),
            sink_table: format!("future_index_{currency}_usd"),
            kind: SourceKind::Index {
                value_field: INDEX_VALUE_FIELD.to_string(),
            },
        });

        for contract in &cfg.contracts {
            sources.push(AssetSource {
                asset_id: format!("future_{currency}_{}", contract.name),
                endpoint_url: format!(
                    "{}/{cur}-USD-{}/book?size={}",
                    cfg.futures_base_url, contract.code, cfg.futures_depth
                ),
                sink_table: format!("future_{currency}_usd_{}_orderbook", contract.name),
                kind: SourceKind::OrderBook,
            });
        }
    }

    sources
}

/// Build the trades group: spot and futures trade prints per configured
/// currency.
pub fn trades_sources(cfg: &CatalogSettings) -> Vec<AssetSource> {
    let mut sources = Vec::new();

    for currency in &cfg.currencies {
        let cur = currency.to_uppercase();

        sources.push(AssetSource {
            asset_id: format!("trades_spot_{currency}"),
            endpoint_url: format!(
                "{}/{cur}-USD/trades?size={}",
                cfg.spot_base_url, cfg.trade_batch
            ),
            sink_table: format!("trades_spot_{currency}"),
            kind: SourceKind::Trades {
                id_field: TRADE_ID_FIELD.to_string(),
            },
        });

        for contract in &cfg.contracts {
            sources.push(AssetSource {
                asset_id: format!("trades_future_{}_{currency}", contract.name),
                endpoint_url: format!(
                    "{}/{cur}-USD-{}/trades?size={}",
                    cfg.futures_base_url, contract.code, cfg.trade_batch
                ),
                sink_table: format!("trades_future_{}_{currency}", contract.name),
                kind: SourceKind::Trades {
                    id_field: TRADE_ID_FIELD.to_string(),
                },
            });
        }
    }

    sources
}
