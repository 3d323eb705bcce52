//! The ingestion loop
//!
//! Drains a live post feed into the database, surviving transient feed
//! failures with a fixed backoff, bounded to a number of consecutive
//! failures. An operator shutdown request (shared flag, set from a
//! signal handler) is honored between posts and between backoff slices,
//! never mid-insert.
//!
//! Known limitation, kept on purpose: re-subscribing after a backoff
//! starts from "now", so posts published during the outage are lost.
//! Likewise, a feed read that hangs forever stalls the loop without
//! counting as a failure; no read timeout is applied here beyond what
//! the feed implementation enforces itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::db::Database;
use crate::error::Result;
use crate::feed::FeedSource;
use crate::types::PostRecord;

pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// How a run ended. Both variants are clean process exits; only the
/// final log line distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Operator requested shutdown.
    Cancelled,
    /// The feed failed `max_retries` consecutive times.
    RetriesExhausted,
}

enum DrainExit {
    Cancelled,
    StreamEnded,
}

pub struct IngestLoop {
    feed: Box<dyn FeedSource>,
    db: Database,
    topic: String,
    backoff: Duration,
    max_retries: u32,
    shutdown: Arc<AtomicBool>,
    retries_taken: u32,
    backoffs_taken: u32,
}

impl IngestLoop {
    pub fn new(
        feed: Box<dyn FeedSource>,
        db: Database,
        topic: impl Into<String>,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            feed,
            db,
            topic: topic.into(),
            backoff: DEFAULT_BACKOFF,
            max_retries: DEFAULT_MAX_RETRIES,
            shutdown,
            retries_taken: 0,
            backoffs_taken: 0,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Transient failures caught so far.
    pub fn retries_taken(&self) -> u32 {
        self.retries_taken
    }

    /// Backoff sleeps taken so far. One per caught failure, including
    /// the one that exhausts the retry budget.
    pub fn backoffs_taken(&self) -> u32 {
        self.backoffs_taken
    }

    /// Run until cancelled, until the retry budget is exhausted, or
    /// until a fatal (non-feed) error propagates.
    pub async fn run(&mut self) -> Result<Outcome> {
        let mut failures: u32 = 0;

        while failures < self.max_retries {
            if self.shutdown_requested() {
                info!("shutdown requested, stopping ingestion");
                return Ok(Outcome::Cancelled);
            }

            match self.drain().await {
                Ok(DrainExit::Cancelled) => {
                    info!("shutdown requested, stopping ingestion");
                    return Ok(Outcome::Cancelled);
                }
                Ok(DrainExit::StreamEnded) => {
                    // A clean stream end resets the failure count. A live
                    // feed never ends cleanly, so this arm only fires
                    // against finite fixtures.
                    failures = 0;
                }
                Err(e) if e.is_transient() => {
                    failures += 1;
                    self.retries_taken += 1;
                    warn!(
                        failures,
                        max_retries = self.max_retries,
                        error = %e,
                        "feed failed, waiting {}s before re-subscribing; \
                         posts published in the meantime will not be recovered",
                        self.backoff.as_secs()
                    );
                    self.backoff_sleep().await;
                }
                Err(e) => return Err(e),
            }
        }

        warn!(
            max_retries = self.max_retries,
            "giving up after consecutive feed failures"
        );
        Ok(Outcome::RetriesExhausted)
    }

    /// Subscribe and consume posts until the subscription fails, ends,
    /// or shutdown is requested.
    async fn drain(&mut self) -> Result<DrainExit> {
        info!(feed = self.feed.name(), topic = %self.topic, "subscribing");
        let mut subscription = self.feed.subscribe(&self.topic, true).await?;

        loop {
            if self.shutdown_requested() {
                return Ok(DrainExit::Cancelled);
            }

            match subscription.next_post().await? {
                Some(raw) => {
                    let record = PostRecord::from_raw(raw)?;
                    info!("{}", record.title);
                    let json = record.to_json()?;
                    self.db.insert_post(record.created_utc, &json).await?;
                }
                None => return Ok(DrainExit::StreamEnded),
            }
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Sleep the backoff in one-second slices so a shutdown request is
    /// honored promptly.
    async fn backoff_sleep(&mut self) {
        self.backoffs_taken += 1;

        let slice = Duration::from_secs(1);
        let mut remaining = self.backoff;
        while !remaining.is_zero() {
            if self.shutdown_requested() {
                return;
            }
            let step = remaining.min(slice);
            sleep(step).await;
            remaining = remaining.saturating_sub(step);
        }
    }
}
