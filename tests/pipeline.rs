//! End-to-end pipeline tests
//!
//! Drive both scheduler groups against a mock exchange and assert on what
//! reaches the store: a full tick fans out every collector, failures stay
//! contained, and overlapping trade polls stay idempotent.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use market_capture::catalog::{AssetSource, SourceKind};
use market_capture::collector::build_collector;
use market_capture::config::GroupSettings;
use market_capture::fetch::SnapshotFetcher;
use market_capture::schema::Side;
use market_capture::scheduler::Scheduler;
use market_capture::storage::{MarketStore, MemoryStore};

fn book_source(server: &MockServer, asset: &str, endpoint: &str) -> AssetSource {
    AssetSource {
        asset_id: asset.to_string(),
        endpoint_url: format!("{}{}", server.uri(), endpoint),
        sink_table: format!("{}_orderbook", asset),
        kind: SourceKind::OrderBook,
    }
}

fn index_source(server: &MockServer, asset: &str, endpoint: &str) -> AssetSource {
    AssetSource {
        asset_id: asset.to_string(),
        endpoint_url: format!("{}{}", server.uri(), endpoint),
        sink_table: format!("future_index_{}", asset),
        kind: SourceKind::Index {
            value_field: "future_index".to_string(),
        },
    }
}

fn trades_source(server: &MockServer, asset: &str, endpoint: &str) -> AssetSource {
    AssetSource {
        asset_id: asset.to_string(),
        endpoint_url: format!("{}{}", server.uri(), endpoint),
        sink_table: format!("trades_{}", asset),
        kind: SourceKind::Trades {
            id_field: "tid".to_string(),
        },
    }
}

fn group(interval_secs: f64, offset_secs: f64) -> GroupSettings {
    GroupSettings {
        interval_secs,
        offset_secs,
    }
}

#[tokio::test]
async fn test_order_book_group_tick_records_books_and_index() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spot_btc/book"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ask": [[6500.5, 1], [6501.0, 2]],
            "bid": [[6500.0, 3], [6499.5, 4]],
        })))
        .mount(&server)
        .await;

    // This book is structurally broken and must not block the others.
    Mock::given(method("GET"))
        .and(path("/spot_eth/book"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ask": [],
            "bid": [[200.0, 1]],
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/btc/index"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "future_index": "6500.42",
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(SnapshotFetcher::new(Duration::from_secs(2)).unwrap());

    let collectors = vec![
        build_collector(
            book_source(&server, "spot_btc", "/spot_btc/book"),
            fetcher.clone(),
            store.clone() as Arc<dyn MarketStore>,
        ),
        build_collector(
            book_source(&server, "spot_eth", "/spot_eth/book"),
            fetcher.clone(),
            store.clone() as Arc<dyn MarketStore>,
        ),
        build_collector(
            index_source(&server, "btc", "/btc/index"),
            fetcher.clone(),
            store.clone() as Arc<dyn MarketStore>,
        ),
    ];

    let scheduler =
        Scheduler::new("order book and futures index", collectors, &group(10.0, 0.001)).unwrap();
    scheduler.run_tick().await;

    let btc_rows = store.levels("spot_btc_orderbook");
    assert_eq!(btc_rows.len(), 4);
    let best_bid = btc_rows
        .iter()
        .find(|r| r.side == Side::Bid && r.level == 1)
        .unwrap();
    assert_eq!(best_bid.price, dec!(6500.0));

    // The malformed book produced nothing, the index still landed.
    assert!(store.levels("spot_eth_orderbook").is_empty());
    let index = store.index_values("future_index_btc");
    assert_eq!(index.len(), 1);
    assert_eq!(index[0].value, dec!(6500.42));
}

#[tokio::test]
async fn test_trades_group_is_idempotent_across_ticks() {
    let server = MockServer::start().await;

    // The same window of trades is returned on every poll, as the real
    // endpoint does for overlapping requests.
    Mock::given(method("GET"))
        .and(path("/btc/trades"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"tid": 900, "date_ms": 1514764800000i64, "amount": 0.5, "price": 6500.0, "type": "buy"},
            {"tid": 901, "date_ms": 1514764801000i64, "amount": 0.7, "price": 6500.5, "type": "sell"},
        ])))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(SnapshotFetcher::new(Duration::from_secs(2)).unwrap());

    let collectors = vec![build_collector(
        trades_source(&server, "spot_btc", "/btc/trades"),
        fetcher,
        store.clone() as Arc<dyn MarketStore>,
    )];

    let scheduler = Scheduler::new("trades", collectors, &group(100.0, 0.1)).unwrap();
    scheduler.run_tick().await;
    scheduler.run_tick().await;
    scheduler.run_tick().await;

    let trades = store.trades("trades_spot_btc");
    assert_eq!(trades.len(), 2);
    // Two inserts on the first tick, none afterwards.
    assert_eq!(store.insert_attempts(), 2);
}

#[tokio::test]
async fn test_unreachable_endpoint_does_not_stop_the_tick() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/good/book"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ask": [[10, 1]],
            "bid": [[9, 1]],
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let fetcher = Arc::new(SnapshotFetcher::new(Duration::from_secs(1)).unwrap());

    let dead = AssetSource {
        asset_id: "dead".to_string(),
        // Nothing listens here; the fetch fails with a transport error.
        endpoint_url: "http://127.0.0.1:9/book".to_string(),
        sink_table: "dead_orderbook".to_string(),
        kind: SourceKind::OrderBook,
    };

    let collectors = vec![
        build_collector(dead, fetcher.clone(), store.clone() as Arc<dyn MarketStore>),
        build_collector(
            book_source(&server, "good", "/good/book"),
            fetcher,
            store.clone() as Arc<dyn MarketStore>,
        ),
    ];

    let scheduler = Scheduler::new("order book", collectors, &group(10.0, 0.001)).unwrap();
    scheduler.run_tick().await;

    assert!(store.levels("dead_orderbook").is_empty());
    assert_eq!(store.levels("good_orderbook").len(), 2);
}
