//! Process-wide pause/stop control flags.
//!
//! Both flags are observed cooperatively at every suspension point: before
//! each attempt, during pause waits, and during retry delays. `stop` always
//! wins over `pause`, is permanent for the run, and is only honored at
//! suspension points; in-flight remote calls are never forcibly aborted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, timeout};
use tracing::debug;

/// Upper bound on how long a waiter sleeps before re-checking the flags.
/// `resume()`/`stop()` wake waiters immediately, so this only bounds the
/// staleness of a wakeup that was lost before a waiter subscribed.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Shared pause/stop state for one batch run.
///
/// Injected into the scheduler and every item processor; all reads and
/// writes go through atomic operations.
#[derive(Debug, Default)]
pub struct RunControl {
    paused: AtomicBool,
    stopped: AtomicBool,
    notify: Notify,
}

impl RunControl {
    /// Creates a new control with both flags clear.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the run is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Whether the run has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Pauses the run. New attempts and new waves wait until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        debug!("run paused");
    }

    /// Resumes a paused run and wakes every waiter.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.notify.notify_waiters();
        debug!("run resumed");
    }

    /// Toggles the pause flag, returning the new state.
    pub fn toggle_pause(&self) -> bool {
        if self.is_paused() {
            self.resume();
            false
        } else {
            self.pause();
            true
        }
    }

    /// Stops the run. Permanent and idempotent: no further attempts or
    /// waves start, and every waiter wakes immediately.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        self.notify.notify_waiters();
        debug!("run stopped");
    }

    /// Clears both flags at the start of a new run.
    pub(crate) fn reset_for_run(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.stopped.store(false, Ordering::SeqCst);
    }

    /// Blocks cooperatively while the run is paused.
    ///
    /// Returns `false` if the run was stopped while (or before) waiting;
    /// callers must then unwind without further side effects.
    pub async fn wait_while_paused(&self) -> bool {
        loop {
            if self.is_stopped() {
                return false;
            }
            if !self.is_paused() {
                return true;
            }
            let _ = timeout(POLL_INTERVAL, self.notify.notified()).await;
        }
    }

    /// Sleeps for `duration`, waking early if the run is stopped.
    ///
    /// Returns `false` if the run was stopped during the delay.
    pub async fn interruptible_delay(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_stopped() {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return true;
            }
            let _ = timeout(remaining.min(POLL_INTERVAL), self.notify.notified()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_flags_start_clear() {
        let control = RunControl::new();
        assert!(!control.is_paused());
        assert!(!control.is_stopped());
        assert!(control.wait_while_paused().await);
    }

    #[tokio::test]
    async fn test_stop_wins_over_pause() {
        let control = RunControl::new();
        control.pause();
        control.stop();
        assert!(control.is_stopped());
        assert!(!control.wait_while_paused().await);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let control = RunControl::new();
        control.stop();
        control.stop();
        assert!(control.is_stopped());
    }

    #[tokio::test]
    async fn test_resume_wakes_paused_waiter() {
        let control = Arc::new(RunControl::new());
        control.pause();

        let waiter = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.wait_while_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        control.resume();
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_stop_wakes_paused_waiter() {
        let control = Arc::new(RunControl::new());
        control.pause();

        let waiter = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.wait_while_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        control.stop();
        assert!(!waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_delay_interrupted_by_stop() {
        let control = Arc::new(RunControl::new());
        let delayed = {
            let control = Arc::clone(&control);
            tokio::spawn(async move { control.interruptible_delay(Duration::from_secs(30)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        control.stop();
        assert!(!delayed.await.unwrap());
    }

    #[tokio::test]
    async fn test_delay_completes_without_stop() {
        let control = RunControl::new();
        assert!(control.interruptible_delay(Duration::from_millis(20)).await);
    }

    #[tokio::test]
    async fn test_toggle_pause() {
        let control = RunControl::new();
        assert!(control.toggle_pause());
        assert!(control.is_paused());
        assert!(!control.toggle_pause());
        assert!(!control.is_paused());
    }
}
