// Client-side login throttle.
//
// A hint only: the backend enforces its own rate limit. Failed attempts
// are counted in the durable tier so they survive a restart.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::storage::SessionStorage;
use crate::error::Error;

pub const LOGIN_ATTEMPTS_KEY: &str = "loginAttempts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttemptRecord {
    attempts: u32,
    /// Epoch milliseconds of the first failure in the window.
    first_attempt: i64,
}

/// Allows `max_attempts` failed logins per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginThrottle {
    pub max_attempts: u32,
    pub window: TimeDelta,
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: TimeDelta::minutes(15),
        }
    }
}

impl LoginThrottle {
    fn load(storage: &dyn SessionStorage) -> Option<AttemptRecord> {
        let raw = storage.get(LOGIN_ATTEMPTS_KEY).ok()??;
        serde_json::from_str(&raw).ok()
    }

    fn expired(&self, record: &AttemptRecord, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() - record.first_attempt > self.window.num_milliseconds()
    }

    /// `Ok` if another attempt is allowed at `now`.
    pub fn check(&self, storage: &dyn SessionStorage, now: DateTime<Utc>) -> Result<(), Error> {
        let Some(record) = Self::load(storage) else {
            return Ok(());
        };

        if self.expired(&record, now) {
            storage.remove(LOGIN_ATTEMPTS_KEY)?;
            return Ok(());
        }

        if record.attempts >= self.max_attempts {
            let elapsed = now.timestamp_millis() - record.first_attempt;
            let remaining_ms = self.window.num_milliseconds() - elapsed;
            // round up to whole minutes
            let retry_in_minutes = (remaining_ms + 59_999) / 60_000;
            return Err(Error::LoginThrottled { retry_in_minutes });
        }

        Ok(())
    }

    pub fn record_failure(
        &self,
        storage: &dyn SessionStorage,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        let record = match Self::load(storage) {
            Some(r) if !self.expired(&r, now) => AttemptRecord {
                attempts: r.attempts.saturating_add(1),
                first_attempt: r.first_attempt,
            },
            _ => AttemptRecord {
                attempts: 1,
                first_attempt: now.timestamp_millis(),
            },
        };
        debug!(attempts = record.attempts, "failed login recorded");
        let raw = serde_json::to_string(&record)
            .map_err(|e| Error::Storage(format!("failed to encode login attempts: {e}")))?;
        storage.set(LOGIN_ATTEMPTS_KEY, &raw)
    }

    pub fn reset(&self, storage: &dyn SessionStorage) -> Result<(), Error> {
        storage.remove(LOGIN_ATTEMPTS_KEY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::MemoryStorage;

    #[test]
    fn blocks_after_five_failures_until_window_passes() {
        let storage = MemoryStorage::new();
        let throttle = LoginThrottle::default();
        let start = Utc::now();

        for _ in 0..5 {
            throttle.check(&storage, start).unwrap();
            throttle.record_failure(&storage, start).unwrap();
        }

        let later = start + TimeDelta::minutes(1);
        match throttle.check(&storage, later) {
            Err(Error::LoginThrottled { retry_in_minutes }) => assert_eq!(retry_in_minutes, 14),
            other => panic!("expected LoginThrottled, got {other:?}"),
        }

        let after_window = start + TimeDelta::minutes(16);
        throttle.check(&storage, after_window).unwrap();
        assert_eq!(storage.get(LOGIN_ATTEMPTS_KEY).unwrap(), None);
    }

    #[test]
    fn failure_after_window_starts_a_new_count() {
        let storage = MemoryStorage::new();
        let throttle = LoginThrottle::default();
        let start = Utc::now();

        for _ in 0..4 {
            throttle.record_failure(&storage, start).unwrap();
        }
        throttle
            .record_failure(&storage, start + TimeDelta::minutes(20))
            .unwrap();
        throttle
            .check(&storage, start + TimeDelta::minutes(21))
            .unwrap();
    }

    #[test]
    fn reset_clears_record() {
        let storage = MemoryStorage::new();
        let throttle = LoginThrottle::default();
        throttle.record_failure(&storage, Utc::now()).unwrap();
        throttle.reset(&storage).unwrap();
        assert_eq!(storage.get(LOGIN_ATTEMPTS_KEY).unwrap(), None);
    }
}
