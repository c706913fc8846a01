//! Snapshot fetcher
//!
//! One timed HTTP GET per collector per tick. The fetcher records
//! request/return timestamps around the request, classifies failures and
//! reports them as part of the result; nothing escapes this boundary as an
//! error. Failed fetches are logged here with the destination table so
//! collectors can simply drop the tick.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// How a fetch failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("response is not valid JSON: {0}")]
    Decode(String),
}

/// A successfully fetched and decoded response.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Taken immediately before the request was issued (epoch nanoseconds).
    pub request_time_ns: i64,
    /// Taken immediately after the response body parsed.
    pub return_time_ns: i64,
    /// Decoded response body.
    pub payload: Value,
}

/// Outcome of a single fetch.
#[derive(Debug, Clone)]
pub enum FetchResult {
    Success(Snapshot),
    Failed(FetchFailure),
}

impl FetchResult {
    /// The snapshot, if the fetch succeeded.
    pub fn snapshot(self) -> Option<Snapshot> {
        match self {
            FetchResult::Success(snapshot) => Some(snapshot),
            FetchResult::Failed(_) => None,
        }
    }
}

/// Current wall-clock time in nanoseconds since the Unix epoch.
///
/// Wall clock rather than monotonic: the values are audit/ordering
/// timestamps stored next to the data, not latency measurements.
pub fn now_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(0)
}

/// HTTP snapshot fetcher shared by all collectors.
pub struct SnapshotFetcher {
    client: reqwest::Client,
}

impl SnapshotFetcher {
    /// Create a fetcher whose requests all use the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Issue one GET against `url` and decode the body as JSON.
    ///
    /// `table` is the destination table of the calling collector and only
    /// appears in failure log messages.
    pub async fn fetch(&self, table: &str, url: &str) -> FetchResult {
        let request_time_ns = now_ns();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return self.fail(table, classify(e)),
        };

        let payload = match response.json::<Value>().await {
            Ok(payload) => payload,
            Err(e) => return self.fail(table, classify(e)),
        };

        let return_time_ns = now_ns();

        FetchResult::Success(Snapshot {
            request_time_ns,
            return_time_ns,
            payload,
        })
    }

    fn fail(&self, table: &str, failure: FetchFailure) -> FetchResult {
        match &failure {
            FetchFailure::Timeout => warn!("timeout error: {}", table),
            FetchFailure::Transport(e) => warn!("transport error: {}: {}", table, e),
            FetchFailure::Decode(e) => warn!("decode error: {}: {}", table, e),
        }
        FetchResult::Failed(failure)
    }
}

/// Map a reqwest error onto the failure taxonomy.
fn classify(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_decode() {
        FetchFailure::Decode(e.to_string())
    } else {
        FetchFailure::Transport(e.to_string())
    }
}
