//! Rotation scheduling
//!
//! A single-shot timer the session engine selects on alongside its command
//! channel. Rotation is an event processed by the same serialized loop as
//! start/stop, never a detached callback: arming, firing, and cancellation
//! all happen on the engine task, so a fire can never race a shutdown.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep, Sleep};

/// Single-shot rotation timer; disarmed timers never fire
#[derive(Default)]
pub struct RotationTimer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl RotationTimer {
    pub fn new() -> Self {
        Self { sleep: None }
    }

    /// Arm for one boundary; replaces any pending deadline
    pub fn arm(&mut self, duration: Duration) {
        self.sleep = Some(Box::pin(sleep(duration)));
    }

    /// Invalidate the pending deadline, if any
    pub fn cancel(&mut self) {
        self.sleep = None;
    }

    pub fn is_armed(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolve at the armed deadline; pend forever while disarmed
    ///
    /// The engine must cancel or re-arm after a fire - an elapsed timer
    /// left in place resolves again immediately.
    pub async fn fired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => sleep.as_mut().await,
            None => pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    #[tokio::test(start_paused = true)]
    async fn fires_at_the_deadline() {
        let mut timer = RotationTimer::new();
        timer.arm(Duration::from_secs(10));

        advance(Duration::from_secs(10)).await;
        timeout(Duration::from_millis(1), timer.fired())
            .await
            .expect("timer should have fired");
    }

    #[tokio::test(start_paused = true)]
    async fn disarmed_timer_pends() {
        let mut timer = RotationTimer::new();
        advance(Duration::from_secs(3600)).await;
        assert!(timeout(Duration::from_millis(1), timer.fired())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_invalidates_a_pending_deadline() {
        let mut timer = RotationTimer::new();
        timer.arm(Duration::from_secs(5));
        timer.cancel();
        assert!(!timer.is_armed());

        advance(Duration::from_secs(10)).await;
        assert!(timeout(Duration::from_millis(1), timer.fired())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_resets_the_deadline() {
        let mut timer = RotationTimer::new();
        timer.arm(Duration::from_secs(10));
        advance(Duration::from_secs(9)).await;
        timer.arm(Duration::from_secs(10));

        advance(Duration::from_secs(9)).await;
        assert!(timeout(Duration::from_millis(1), timer.fired())
            .await
            .is_err());

        advance(Duration::from_secs(1)).await;
        timeout(Duration::from_millis(1), timer.fired())
            .await
            .expect("timer should fire at the new deadline");
    }
}
