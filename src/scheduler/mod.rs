//! Tick scheduler
//!
//! Drives one polling group: sleep until the next wall-clock-aligned
//! boundary, fan out one task per collector, wait for the whole batch,
//! repeat forever. Ticks are aligned to multiples of the interval so
//! samples land on round timestamps regardless of when the process
//! started; the configured offset nudges the group slightly past the
//! boundary so parallel processes sharing an interval do not fire
//! together.
//!
//! Within a tick collectors are independent and may finish in any order.
//! Because the loop waits for every task before sleeping again, a
//! collector's `run_once` invocations never overlap across ticks; one
//! slow collector delays the next tick, which is accepted.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use crate::collector::Collector;
use crate::config::GroupSettings;

/// Exchange request-rate ceiling: at most this many requests per second
/// across a group (one request every 0.1 seconds).
pub const RATE_CEILING: f64 = 10.0;

/// Fatal configuration problems detected before the loop starts.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error(
        "{collectors} collectors at a {interval_secs}s interval exceeds the \
         exchange's limit of one request every 0.1 seconds"
    )]
    RateCeilingExceeded {
        collectors: usize,
        interval_secs: f64,
    },

    #[error("interval must be positive, got {0}")]
    InvalidInterval(f64),
}

/// Scheduler for one group of collectors.
pub struct Scheduler {
    label: String,
    collectors: Vec<Arc<dyn Collector>>,
    interval_secs: f64,
    offset_secs: f64,
}

impl Scheduler {
    /// Register a group of collectors under a cadence.
    ///
    /// Fails when the interval is not positive or when the group would
    /// exceed [`RATE_CEILING`]; both are startup errors, nothing is
    /// retried at run time.
    pub fn new(
        label: impl Into<String>,
        collectors: Vec<Arc<dyn Collector>>,
        group: &GroupSettings,
    ) -> Result<Self, SchedulerError> {
        if group.interval_secs <= 0.0 {
            return Err(SchedulerError::InvalidInterval(group.interval_secs));
        }
        if collectors.len() as f64 / group.interval_secs > RATE_CEILING {
            return Err(SchedulerError::RateCeilingExceeded {
                collectors: collectors.len(),
                interval_secs: group.interval_secs,
            });
        }

        Ok(Self {
            label: label.into(),
            collectors,
            interval_secs: group.interval_secs,
            offset_secs: group.offset_secs,
        })
    }

    /// Number of registered collectors.
    pub fn collector_count(&self) -> usize {
        self.collectors.len()
    }

    /// Run the scheduling loop. Never returns under normal operation.
    pub async fn run(&self) {
        loop {
            let delay = delta_time_to_sleep(self.interval_secs, self.offset_secs, epoch_secs());
            tokio::time::sleep(Duration::from_secs_f64(delay)).await;

            info!("Requesting {}.", self.label);
            self.run_tick().await;
        }
    }

    /// Run every collector once, concurrently, and wait for all of them.
    ///
    /// A task that fails or panics is logged with its collector's table
    /// and does not affect its siblings or the next tick.
    pub async fn run_tick(&self) {
        let handles: Vec<_> = self
            .collectors
            .iter()
            .map(|collector| {
                let collector = collector.clone();
                tokio::spawn(async move { collector.run_once().await })
            })
            .collect();

        for (collector, joined) in self.collectors.iter().zip(join_all(handles).await) {
            let table = &collector.source().sink_table;
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("collector {} failed: {}", table, e),
                Err(e) => warn!("collector {} panicked: {}", table, e),
            }
        }
    }
}

/// Seconds to sleep until the next aligned boundary plus the offset:
/// `interval − (now mod interval) + offset`.
pub fn delta_time_to_sleep(interval: f64, offset: f64, now: f64) -> f64 {
    interval - now % interval + offset
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
fn epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
