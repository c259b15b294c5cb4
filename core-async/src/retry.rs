//! Bounded polling.
//!
//! Every wait in the authentication flow (capability readiness, private-key
//! availability, token materialization) is expressed as a [`RetryPolicy`]
//! consumed by [`poll_until`]. No wait is unbounded: the probe runs at most
//! `max_attempts` times with `interval` between consecutive attempts.

use crate::time::{sleep, Duration};
use std::future::Future;
use thiserror::Error;

/// Fixed-interval, fixed-attempt retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay between two consecutive attempts.
    pub interval: Duration,
    /// Maximum number of probe invocations.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub const fn from_millis(interval_ms: u64, max_attempts: u32) -> Self {
        Self::new(Duration::from_millis(interval_ms), max_attempts)
    }

    /// Upper bound on the time spent sleeping between attempts.
    pub fn total_budget(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Result of a single probe invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The awaited condition holds; polling stops with this value.
    Ready(T),
    /// Not yet; try again after the interval if attempts remain.
    Pending,
    /// Stop immediately without consuming the remaining attempts.
    Abort(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("condition not met after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("polling aborted on attempt {attempt}: {reason}")]
    Aborted { attempt: u32, reason: String },
}

/// Invokes `probe` until it reports [`Probe::Ready`], aborts, or the policy's
/// attempt budget is spent.
///
/// The probe receives the 1-based attempt number. The interval is slept only
/// between attempts, never after the final one.
pub async fn poll_until<T, F, Fut>(policy: RetryPolicy, mut probe: F) -> Result<T, PollError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Probe<T>>,
{
    for attempt in 1..=policy.max_attempts {
        match probe(attempt).await {
            Probe::Ready(value) => return Ok(value),
            Probe::Abort(reason) => return Err(PollError::Aborted { attempt, reason }),
            Probe::Pending => {}
        }

        if attempt < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }

    Err(PollError::Exhausted {
        attempts: policy.max_attempts,
    })
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_total_budget() {
        let policy = RetryPolicy::from_millis(200, 30);
        assert_eq!(policy.total_budget(), Duration::from_millis(5800));
        assert_eq!(
            RetryPolicy::from_millis(200, 0).total_budget(),
            Duration::ZERO
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_on_first_attempt_does_not_sleep() {
        let start = tokio::time::Instant::now();
        let result = poll_until(RetryPolicy::from_millis(200, 5), |_| async { Probe::Ready(7) }).await;

        assert_eq!(result, Ok(7));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_after_pending_attempts() {
        let calls = AtomicU32::new(0);
        let result = poll_until(RetryPolicy::from_millis(100, 10), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 4 {
                    Probe::Ready(attempt)
                } else {
                    Probe::Pending
                }
            }
        })
        .await;

        assert_eq!(result, Ok(4));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();
        let result: Result<(), _> = poll_until(RetryPolicy::from_millis(200, 3), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Probe::Pending }
        })
        .await;

        assert_eq!(result, Err(PollError::Exhausted { attempts: 3 }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two sleeps between three attempts.
        assert_eq!(start.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_stops_early() {
        let result: Result<(), _> = poll_until(RetryPolicy::from_millis(50, 10), |attempt| async move {
            if attempt == 2 {
                Probe::Abort("boom".to_string())
            } else {
                Probe::Pending
            }
        })
        .await;

        assert_eq!(
            result,
            Err(PollError::Aborted {
                attempt: 2,
                reason: "boom".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_zero_attempts_is_immediately_exhausted() {
        let result: Result<(), _> =
            poll_until(RetryPolicy::from_millis(50, 0), |_| async { Probe::Pending }).await;
        assert_eq!(result, Err(PollError::Exhausted { attempts: 0 }));
    }
}
