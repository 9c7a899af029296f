//! Bounded retry policy and the sleep seam used between attempts.
//!
//! The client asks the policy how long to wait; it never computes delays
//! itself. Tests swap [`TokioSleeper`] for [`InstantSleeper`] so a retry
//! storm finishes immediately and the chosen delays can be asserted.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Why an attempt failed in a way the client may retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCause {
    /// 429 or 503. `retry_after` is the server hint in seconds, if any.
    Status { retry_after: Option<u64> },
    /// Connect/timeout/body read failure.
    Network,
}

/// Retry budget and backoff shape.
///
/// ```
/// use std::time::Duration;
/// use wander_http::retry::{RetryCause, RetryPolicy};
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 3);
/// // linear in the attempt number when the server gives no hint
/// assert_eq!(
///     policy.delay_for(RetryCause::Status { retry_after: None }, 2),
///     Duration::from_millis(3000)
/// );
/// // server hint wins
/// assert_eq!(
///     policy.delay_for(RetryCause::Status { retry_after: Some(4) }, 1),
///     Duration::from_secs(4)
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    /// Step of the linear backoff after a 429/503 without `Retry-After`.
    pub status_backoff: Duration,
    /// Fixed wait after a network-level failure.
    pub network_backoff: Duration,
    /// Upper bound applied to a server supplied `Retry-After`.
    pub max_retry_after: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            status_backoff: Duration::from_millis(1500),
            network_backoff: Duration::from_millis(500),
            max_retry_after: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy that never waits. Handy for tests and offline tooling.
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            status_backoff: Duration::ZERO,
            network_backoff: Duration::ZERO,
            max_retry_after: Duration::ZERO,
        }
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay_for(&self, cause: RetryCause, attempt: usize) -> Duration {
        match cause {
            RetryCause::Status {
                retry_after: Some(secs),
            } => Duration::from_secs(secs).min(self.max_retry_after),
            RetryCause::Status { retry_after: None } => {
                self.status_backoff.saturating_mul(attempt.max(1) as u32)
            }
            RetryCause::Network => self.network_backoff,
        }
    }
}

/// Waits between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, dur: Duration);
}

/// Real waiting on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

/// Returns immediately and remembers every requested delay.
#[derive(Debug, Default)]
pub struct InstantSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl InstantSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, dur: Duration) {
        if let Ok(mut d) = self.delays.lock() {
            d.push(dur);
        }
    }
}
