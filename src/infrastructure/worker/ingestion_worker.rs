use std::env;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::application::services::{IngestionQueue, JobProcessor};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    pub db_wait_timeout: Duration,
    pub db_wait_poll: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: duration_from_env("INGESTION_WORKER_POLL_MS", 2_000),
            db_wait_timeout: duration_from_env("INGESTION_WORKER_DB_WAIT_TIMEOUT_MS", 30_000),
            db_wait_poll: duration_from_env("INGESTION_WORKER_DB_WAIT_POLL_MS", 500),
        }
    }
}

fn duration_from_env(key: &str, default_ms: u64) -> Duration {
    let ms = env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

/// Periodic tick claiming at most one job at a time.
///
/// A reentrancy flag keeps ticks from overlapping even if a slow job spans
/// several poll intervals, and the shutdown flag lets the in-flight tick
/// finish naturally while refusing new ones.
pub struct IngestionWorker {
    queue: Arc<IngestionQueue>,
    processor: Arc<JobProcessor>,
    config: WorkerConfig,
    shutting_down: AtomicBool,
    tick_in_flight: AtomicBool,
    startup_error_logged: AtomicBool,
}

impl IngestionWorker {
    pub fn new(
        queue: Arc<IngestionQueue>,
        processor: Arc<JobProcessor>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue,
            processor,
            config,
            shutting_down: AtomicBool::new(false),
            tick_in_flight: AtomicBool::new(false),
            startup_error_logged: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Stop starting new ticks; the current one runs to completion.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        info!("ingestion worker shutting down");
    }

    pub async fn run(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "ingestion worker started"
        );

        loop {
            ticker.tick().await;
            if self.shutting_down.load(Ordering::SeqCst) {
                break;
            }
            self.tick().await;
        }
        info!("ingestion worker stopped");
    }

    /// One poll: claim at most one job and process it to completion.
    pub async fn tick(&self) {
        if self.shutting_down.load(Ordering::SeqCst) {
            return;
        }
        if self
            .tick_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        match self.queue.claim_next().await {
            Ok(Some(job)) => {
                self.startup_error_logged.store(false, Ordering::SeqCst);
                self.processor.process(job.id()).await;
            }
            Ok(None) => {
                self.startup_error_logged.store(false, Ordering::SeqCst);
            }
            Err(err) => {
                let message = err.to_string();
                if is_transient_infrastructure_error(&message) {
                    // The database is still coming up; one line until it
                    // recovers, not one per tick.
                    if !self.startup_error_logged.swap(true, Ordering::SeqCst) {
                        warn!(error = %message, "database not reachable yet, retrying quietly");
                    }
                } else {
                    error!(error = %message, "failed to claim next job");
                }
            }
        }

        self.tick_in_flight.store(false, Ordering::SeqCst);
    }
}

/// Errors that precede a claim and should never consume a job attempt:
/// the database still starting up or not accepting connections at all.
pub fn is_transient_infrastructure_error(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("57p03")
        || lowered.contains("database system is starting up")
        || lowered.contains("connection refused")
        || lowered.contains("econnrefused")
}
