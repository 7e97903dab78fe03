//! Fixed inter-request delay that gives way to cancellation

use crate::session::CancelToken;
use std::time::Duration;
use tokio::time::sleep;

/// How a delay ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayOutcome {
    Elapsed,
    Cancelled,
}

/// Paces consecutive page requests of one session
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    delay: Duration,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleeps for the configured delay, returning early on cancellation
    pub async fn wait(&self, cancel: &CancelToken) -> DelayOutcome {
        if cancel.is_cancelled() {
            return DelayOutcome::Cancelled;
        }
        if self.delay.is_zero() {
            return DelayOutcome::Elapsed;
        }

        tokio::select! {
            _ = sleep(self.delay) => DelayOutcome::Elapsed,
            _ = cancel.cancelled() => DelayOutcome::Cancelled,
        }
    }
}
