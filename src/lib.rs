//! # Market Capture
//!
//! Polling daemon that records exchange market data into PostgreSQL.
//!
//! ## Features
//!
//! - **Order-book snapshots**: full-depth bid/ask levels, ranked best-first
//! - **Futures index values**: appended on every successful poll
//! - **Trade prints**: deduplicated by exchange trade id across overlapping polls
//!
//! ## Architecture
//!
//! A wall-clock-aligned scheduler fans out one task per registered collector
//! on every tick and waits for the whole batch before sleeping again. Each
//! collector owns a single asset/endpoint/table triple and runs
//! fetch → validate → normalize → persist. Persistence goes through the
//! [`storage::MarketStore`] trait; the PostgreSQL implementation acquires a
//! pooled connection per call so a dropped connection never outlives the
//! call that noticed it.

pub mod book;
pub mod catalog;
pub mod cli;
pub mod collector;
pub mod config;
pub mod fetch;
pub mod schema;
pub mod scheduler;
pub mod storage;

// Re-export commonly used types
pub use catalog::{AssetSource, SourceKind};
pub use config::Settings;
pub use fetch::{FetchFailure, FetchResult, Snapshot, SnapshotFetcher};
pub use schema::{IndexValue, OrderBookLevel, Side, TradeRecord};
pub use scheduler::Scheduler;
pub use storage::{MarketStore, MemoryStore, PostgresStore, StorageError};
