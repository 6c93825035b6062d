// Idle-session watchdog.
//
// A single deferred timer: activity pushes the deadline out, expiry runs the
// logout action once and the task ends. Nothing fires while the host is not
// running the runtime.

use std::future::Future;
use std::time::Duration;

use strum::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Idle period after which the session is ended.
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// User activity that counts as "not idle".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ActivityEvent {
    MouseDown,
    KeyDown,
    Scroll,
    TouchStart,
}

/// Cloneable sender for activity sources (input handlers, etc.).
#[derive(Debug, Clone)]
pub struct ActivityHandle {
    tx: mpsc::UnboundedSender<ActivityEvent>,
}

impl ActivityHandle {
    /// Reset the idle timer. A no-op once the watchdog has fired or stopped.
    pub fn record(&self, event: ActivityEvent) {
        let _ = self.tx.send(event);
    }
}

/// Running idle timer. Dropping it stops the timer.
#[derive(Debug)]
pub struct SessionWatchdog {
    activity: ActivityHandle,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl SessionWatchdog {
    /// Arm the timer. `on_expire` runs at most once, after `idle` passes
    /// without any recorded activity.
    pub fn spawn<F, Fut>(idle: Duration, on_expire: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let stopped = cancel.clone();
        let mut on_expire = Some(on_expire);

        let handle = tokio::spawn(async move {
            let deadline = tokio::time::sleep(idle);
            tokio::pin!(deadline);

            loop {
                tokio::select! {
                    () = stopped.cancelled() => {
                        debug!("session watchdog stopped");
                        return;
                    }
                    event = rx.recv() => {
                        let Some(event) = event else { return };
                        trace!(%event, "activity, idle timer reset");
                        deadline.as_mut().reset(Instant::now() + idle);
                    }
                    () = &mut deadline => {
                        info!(idle_secs = idle.as_secs(), "session idle, expiring");
                        if let Some(expire) = on_expire.take() {
                            expire().await;
                        }
                        return;
                    }
                }
            }
        });

        Self {
            activity: ActivityHandle { tx },
            cancel,
            handle,
        }
    }

    pub fn record_activity(&self, event: ActivityEvent) {
        self.activity.record(event);
    }

    pub fn activity_handle(&self) -> ActivityHandle {
        self.activity.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// `true` once the timer has fired or been stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SessionWatchdog {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    const IDLE: Duration = Duration::from_secs(60);

    fn counting() -> (Arc<AtomicU32>, SessionWatchdog) {
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let dog = SessionWatchdog::spawn(IDLE, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (fired, dog)
    }

    #[tokio::test(start_paused = true)]
    async fn expires_exactly_once() {
        let (fired, dog) = counting();

        tokio::time::sleep(IDLE + Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        tokio::time::sleep(IDLE * 5).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(dog.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn activity_before_expiry_resets_timer() {
        let (fired, dog) = counting();

        tokio::time::sleep(IDLE - Duration::from_secs(5)).await;
        dog.record_activity(ActivityEvent::KeyDown);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "fired despite activity");

        dog.activity_handle().record(ActivityEvent::Scroll);
        tokio::time::sleep(IDLE - Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_watchdog_never_fires() {
        let (fired, dog) = counting();
        dog.stop();
        tokio::time::sleep(IDLE * 2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn activity_names() {
        assert_eq!(ActivityEvent::MouseDown.to_string(), "mousedown");
        assert_eq!(ActivityEvent::TouchStart.to_string(), "touchstart");
    }
}
