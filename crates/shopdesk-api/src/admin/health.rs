// Backend readiness probe.
//
// Unlike `fetch_with_retry`, any failure here is retried: the probe exists
// to wait out a cold start before the login form is offered.

use std::time::Duration;

use tracing::{debug, info};

use super::client::AdminClient;
use crate::error::Error;

/// How long to wait for `/health` to answer 2xx.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthCheck {
    pub max_attempts: u32,
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(3),
            timeout: Duration::from_secs(5),
        }
    }
}

impl AdminClient {
    /// Poll `GET {base}/health` until it answers 2xx.
    ///
    /// Returns the attempt number that succeeded.
    pub async fn check_server_health(&self, check: &HealthCheck) -> Result<u32, Error> {
        let url = self.url("/health")?;

        for attempt in 1..=check.max_attempts {
            info!(
                "Connecting to server... (Attempt {attempt}/{})",
                check.max_attempts
            );
            match tokio::time::timeout(check.timeout, self.http.get(url.clone()).send()).await {
                Ok(Ok(resp)) if resp.status().is_success() => {
                    info!("server ready");
                    return Ok(attempt);
                }
                Ok(Ok(resp)) => debug!(status = resp.status().as_u16(), "health not ok"),
                Ok(Err(e)) => debug!(error = %e, "health probe failed"),
                Err(_) => debug!(timeout_secs = check.timeout.as_secs(), "health probe timed out"),
            }

            if attempt < check.max_attempts {
                info!(
                    "Server is waking up... Retrying in {}s ({attempt}/{})",
                    check.delay.as_secs(),
                    check.max_attempts
                );
                tokio::time::sleep(check.delay).await;
            }
        }

        Err(Error::ServerUnavailable {
            attempts: check.max_attempts,
        })
    }
}
