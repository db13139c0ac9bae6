//! Bounded retry for transient "resource busy" responses.
//!
//! One logical call moves through `Attempting → {Success, Retrying, Exhausted}`.
//! Terminal errors are returned straight away; retryable ones (423, 429, 5xx)
//! wait for `Retry-After` or the default delay and re-run the same attempt.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{Error, Result};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 60;

/// Default delay when the server does not send `Retry-After`.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Parameters for the retry controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of retries; at most `max_retries + 1` requests are made
    pub max_retries: u32,
    /// Delay used when `Retry-After` is absent or invalid
    #[serde(rename = "default_delay_secs", with = "crate::config::duration_secs")]
    pub default_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            default_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            default_delay: Duration::ZERO,
        }
    }

    /// Delay before retrying after `error`.
    pub fn delay_for(&self, error: &Error) -> Duration {
        error.retry_after().unwrap_or(self.default_delay)
    }
}

/// Run `attempt` until it succeeds, fails terminally or the policy is exhausted.
///
/// The returned value is always the outcome of the last attempt. Exhaustion
/// wraps the last observed error in [`Error::RetriesExhausted`].
pub async fn retry_with_policy<F, Fut, T>(
    ctx: &Context,
    policy: &RetryPolicy,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries = 0u32;

    loop {
        ctx.check()?;

        let err = match attempt().await {
            Ok(value) => {
                if retries > 0 {
                    debug!("Operation succeeded after {} retries", retries);
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() => e,
            Err(e) => return Err(e),
        };

        if retries >= policy.max_retries {
            warn!("Giving up after {} attempts: {}", retries + 1, err);
            return Err(Error::RetriesExhausted {
                attempts: retries + 1,
                source: Box::new(err),
            });
        }

        let delay = policy.delay_for(&err);
        warn!(
            "Request failed with {}, retrying in {:?} (retry {}/{})",
            err,
            delay,
            retries + 1,
            policy.max_retries
        );

        ctx.sleep(delay).await?;
        retries += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            default_delay: Duration::from_millis(1),
        }
    }

    /// Fails with `status` until the `succeed_on`-th call.
    async fn run_until(status: u16, succeed_on: u32, policy: &RetryPolicy) -> (Result<u32>, u32) {
        let calls = AtomicU32::new(0);
        let result = retry_with_policy(&Context::background(), policy, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= succeed_on {
                Ok(n)
            } else {
                Err(Error::api(status, "busy"))
            }
        })
        .await;
        (result, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_retryable_statuses_resolve() {
        for status in [423, 429, 500, 502, 503] {
            let (result, calls) = run_until(status, 3, &policy(u32::MAX)).await;
            assert_eq!(result.unwrap(), 3, "status {}", status);
            assert_eq!(calls, 3, "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_terminal_statuses_single_attempt() {
        for status in [401, 404, 409, 422] {
            let (result, calls) = run_until(status, 100, &policy(50)).await;
            let err = result.unwrap_err();
            assert_eq!(err.status(), Some(status));
            assert!(matches!(err, Error::Api(_)));
            assert_eq!(calls, 1, "status {}", status);
        }
    }

    #[tokio::test]
    async fn test_exhaustion_makes_n_plus_one_requests() {
        let (result, calls) = run_until(423, u32::MAX, &policy(4)).await;
        assert_eq!(calls, 5);
        match result.unwrap_err() {
            Error::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 5);
                assert_eq!(source.status(), Some(423));
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zero_retries_single_request() {
        let (result, calls) = run_until(503, u32::MAX, &RetryPolicy::none()).await;
        assert_eq!(calls, 1);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 1, .. }));
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_sets_delay() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 3,
            default_delay: Duration::from_secs(10),
        };

        let start = Instant::now();
        let result = retry_with_policy(&Context::background(), &policy, || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                let mut err = ApiError::new(429, "slow down");
                err.retry_after = Some(Duration::from_secs(2));
                Err(Error::Api(err))
            } else {
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(2010), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_retry_after_uses_default() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_retries: 3,
            default_delay: Duration::from_secs(7),
        };

        let start = Instant::now();
        let result = retry_with_policy(&Context::background(), &policy, || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::api(423, "locked"))
            } else {
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(7), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(7010), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_during_backoff() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let policy = RetryPolicy {
            max_retries: 10,
            default_delay: Duration::from_secs(60),
        };

        let result: Result<()> =
            retry_with_policy(&ctx, &policy, || async { Err(Error::api(503, "down")) }).await;
        assert!(matches!(result, Err(Error::DeadlineExceeded)));
    }
}
