// Timeout-only retry with capped exponential backoff.
//
// The backend runs on an instance that sleeps when idle, so the first
// request after a quiet period can hang while it boots. Only that case is
// retried: every attempt gets its own deadline, and a tripped deadline
// drops (cancels) the in-flight call before the next attempt. Any other
// failure is returned immediately.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::Error;

/// Ceiling for the inter-retry delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

const BACKOFF_FACTOR: f64 = 1.5;

/// Per-call retry configuration. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retries: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl RetryPolicy {
    /// Build a policy. Delay and timeout must be non-zero.
    pub fn new(retries: u32, retry_delay: Duration, timeout: Duration) -> Result<Self, Error> {
        if retry_delay.is_zero() {
            return Err(Error::Validation {
                field: "retry_delay",
                reason: "must be greater than zero".into(),
            });
        }
        if timeout.is_zero() {
            return Err(Error::Validation {
                field: "timeout",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(Self {
            retries,
            retry_delay,
            timeout,
        })
    }

    /// Policy used by panel API calls.
    pub const fn api() -> Self {
        Self {
            retries: 2,
            retry_delay: Duration::from_millis(2000),
            timeout: Duration::from_secs(90),
        }
    }

    /// Policy used by the login form.
    pub const fn login() -> Self {
        Self {
            retries: 3,
            retry_delay: Duration::from_millis(2500),
            timeout: Duration::from_secs(90),
        }
    }

    /// Policy used for the dashboard's initial token verification.
    pub const fn verify() -> Self {
        Self {
            retries: 3,
            retry_delay: Duration::from_millis(3000),
            timeout: Duration::from_secs(90),
        }
    }

    /// Single short attempt for fire-and-forget notifications.
    pub const fn best_effort() -> Self {
        Self {
            retries: 0,
            retry_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Total attempts this policy allows (`retries + 1`).
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// The delays slept between attempts, in order.
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.retry_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay: Duration::from_millis(3000),
            timeout: Duration::from_secs(90),
        }
    }
}

/// Infinite sequence `d, 1.5d, 1.5²d, …`, each term capped at
/// [`MAX_RETRY_DELAY`]. No jitter.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
}

impl Backoff {
    pub fn new(initial: Duration) -> Self {
        Self {
            next: initial.min(MAX_RETRY_DELAY),
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = current.mul_f64(BACKOFF_FACTOR).min(MAX_RETRY_DELAY);
        Some(current)
    }
}

/// Drive `attempt` until it succeeds, fails with a non-timeout error, or
/// the policy runs out of attempts.
///
/// `attempt` receives the 1-based attempt number. Each returned future is
/// raced against the policy timeout; losing the race drops it.
pub async fn retry_on_timeout<T, F, Fut>(policy: &RetryPolicy, mut attempt: F) -> Result<T, Error>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let total = policy.max_attempts();
    let timeout_ms = millis(policy.timeout);
    let mut delays = policy.backoff();
    let mut last_err = None;

    for n in 1..=total {
        let err = match tokio::time::timeout(policy.timeout, attempt(n)).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) if e.is_timeout() => e,
            Ok(Err(e)) => return Err(e),
            Err(_elapsed) => Error::Timeout {
                timeout_ms,
                attempts: n,
            },
        };
        debug!(attempt = n, error = %err, "attempt timed out");
        last_err = Some(err);

        if n < total {
            let Some(delay) = delays.next() else { break };
            info!(
                "Retry attempt {n}/{retries} after {delay_ms}ms...",
                retries = policy.retries,
                delay_ms = millis(delay),
            );
            tokio::time::sleep(delay).await;
        }
    }

    Err(match last_err {
        Some(Error::Timeout { .. }) | None => Error::Timeout {
            timeout_ms,
            attempts: total,
        },
        Some(other) => other,
    })
}

/// Send `request`, retrying timed-out attempts per `policy`.
///
/// The request is cloned for every attempt, so streaming bodies are
/// rejected with [`Error::RequestNotCloneable`].
pub async fn fetch_with_retry(
    http: &reqwest::Client,
    request: reqwest::Request,
    policy: &RetryPolicy,
) -> Result<reqwest::Response, Error> {
    debug!("{} {}", request.method(), request.url());

    retry_on_timeout(policy, |_| {
        let next = request.try_clone();
        async move {
            let req = next.ok_or(Error::RequestNotCloneable)?;
            http.execute(req).await.map_err(Error::Network)
        }
    })
    .await
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;
    use tokio::time::Instant;

    use super::*;

    fn policy(retries: u32, delay_ms: u64, timeout_ms: u64) -> RetryPolicy {
        RetryPolicy::new(
            retries,
            Duration::from_millis(delay_ms),
            Duration::from_millis(timeout_ms),
        )
        .unwrap()
    }

    #[test]
    fn backoff_grows_by_half_and_caps() {
        let delays: Vec<u64> = Backoff::new(Duration::from_millis(3000))
            .take(6)
            .map(millis)
            .collect();
        assert_eq!(delays, vec![3000, 4500, 6750, 10_000, 10_000, 10_000]);
    }

    #[test]
    fn backoff_never_exceeds_cap() {
        for initial_ms in [1, 250, 2000, 9999, 10_000, 25_000] {
            let over = Backoff::new(Duration::from_millis(initial_ms))
                .take(40)
                .any(|d| d > MAX_RETRY_DELAY);
            assert!(!over, "initial {initial_ms}ms produced a delay above the cap");
        }
    }

    #[test]
    fn zero_delay_or_timeout_rejected() {
        assert!(RetryPolicy::new(1, Duration::ZERO, Duration::from_secs(1)).is_err());
        assert!(RetryPolicy::new(1, Duration::from_secs(1), Duration::ZERO).is_err());
        assert_eq!(RetryPolicy::api().max_attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_timeout_makes_retries_plus_one_attempts() {
        for retries in 0..=4 {
            let calls = Cell::new(0u32);
            let result: Result<(), Error> = retry_on_timeout(&policy(retries, 100, 1000), |_| {
                calls.set(calls.get() + 1);
                std::future::pending()
            })
            .await;

            assert_eq!(calls.get(), retries + 1);
            match result {
                Err(Error::Timeout {
                    attempts,
                    timeout_ms,
                }) => {
                    assert_eq!(attempts, retries + 1);
                    assert_eq!(timeout_ms, 1000);
                }
                other => panic!("expected Timeout, got {other:?}"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_timeout_error_is_not_retried() {
        let calls = Cell::new(0u32);
        let result: Result<(), Error> = retry_on_timeout(&policy(5, 100, 1000), |_| {
            calls.set(calls.get() + 1);
            async { Err(Error::Storage("dns lookup failed".into())) }
        })
        .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(Error::Storage(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_once_server_wakes_up() {
        let start = Instant::now();
        let result = retry_on_timeout(&policy(3, 200, 1000), |n| async move {
            if n < 3 {
                std::future::pending::<()>().await;
            }
            Ok::<_, Error>(n)
        })
        .await
        .unwrap();

        assert_eq!(result, 3);
        // two timeouts + 200ms + 300ms of backoff
        let expected = Duration::from_millis(2 * 1000 + 200 + 300);
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(5),
            "elapsed {elapsed:?}, expected {expected:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn no_sleep_after_final_attempt() {
        let start = Instant::now();
        let _ = retry_on_timeout(&policy(1, 5000, 1000), |_| {
            std::future::pending::<Result<(), Error>>()
        })
        .await;

        let elapsed = start.elapsed();
        assert!(elapsed < Duration::from_millis(7005), "elapsed {elapsed:?}");
    }
}
