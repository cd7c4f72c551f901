//! Retry policy and clock abstraction for the unattended polling loop.
//!
//! Every timed wait in the crate goes through a [`Clock`], so tests can swap in
//! a clock that records sleeps instead of performing them.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Default delay between fetch attempts after a transport failure.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Source of time for sleeps and timestamps.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Suspends the caller for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Returns the current local time.
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock backed by tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// How many times to attempt an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries without limit
    pub max_attempts: Option<u32>,
    /// Fixed delay after each failed attempt
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::forever(DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// Retries without limit, sleeping `delay` after each failure.
    pub fn forever(delay: Duration) -> Self {
        Self { max_attempts: None, delay }
    }

    /// Gives up after `max_attempts` failures.
    pub fn limited(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts: Some(max_attempts.max(1)), delay }
    }

    /// True if another attempt is allowed after `attempts` failures.
    pub fn allows_retry(&self, attempts: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts < max)
    }

    /// Runs `op` until it succeeds or the policy is exhausted.
    ///
    /// Each failure is followed by a sleep on `clock`. With an unlimited policy
    /// this only ever returns `Ok`.
    pub async fn run<T, E, F, Fut>(&self, clock: &dyn Clock, mut op: F) -> Result<T>
    where
        E: std::error::Error + Send + Sync + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempts = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempts += 1;

                    if !self.allows_retry(attempts) {
                        return Err(
                            anyhow!(e).context(format!("Giving up after {} attempts", attempts))
                        );
                    }

                    debug!("Attempt {} failed: {}", attempts, e);
                    clock.sleep(self.delay).await;
                }
            }
        }
    }
}
