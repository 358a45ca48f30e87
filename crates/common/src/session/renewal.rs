//! One-shot renewal timer
//!
//! A [`RenewalTimer`] owns a spawned task that sleeps for a delay and then
//! runs a renewal future once. Dropping or cancelling the timer aborts the
//! task, including a renewal that is already in flight.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use classeviva_domain::RenewalConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Cancellable delayed task
#[derive(Debug)]
pub struct RenewalTimer {
    id: u64,
    fires_at: DateTime<Utc>,
    cancellation_token: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl RenewalTimer {
    /// Spawn `renew(id)` after `delay`. Must be called inside a Tokio runtime.
    ///
    /// The closure receives the timer id so the renewal can tell its own timer
    /// apart from a newer one.
    pub fn arm<F, Fut>(delay: Duration, renew: F) -> Self
    where
        F: FnOnce(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed);
        let cancellation_token = CancellationToken::new();
        let cancel = cancellation_token.clone();
        let fires_at = Utc::now()
            + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

        let task_handle = tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(timer = id, "renewal cancelled before firing");
                }
                () = tokio::time::sleep(delay) => {
                    debug!(timer = id, "renewal timer fired");
                    renew(id).await;
                }
            }
        });

        debug!(timer = id, delay_secs = delay.as_secs(), "renewal timer armed");

        Self { id, fires_at, cancellation_token, task_handle: Some(task_handle) }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn fires_at(&self) -> DateTime<Utc> {
        self.fires_at
    }

    /// True until the task has finished or been cancelled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.cancellation_token.is_cancelled()
            && self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the timer and abort a renewal in flight.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    /// Release the timer without touching its task.
    ///
    /// Used by the renewal itself when it replaces its own timer with a fresh
    /// one; aborting there would cancel the running renewal.
    pub fn detach(mut self) {
        self.task_handle.take();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            self.cancellation_token.cancel();
            handle.abort();
            debug!(timer = self.id, "renewal timer cancelled");
        }
    }
}

impl Drop for RenewalTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// How long to wait before renewing a credential that expires at `expiration`.
///
/// Renews `config.lead()` before expiry. When the remaining validity is
/// shorter than the lead time, renews halfway through what is left. Without
/// an expiry the fallback period is used.
#[must_use]
pub fn renewal_delay(
    expiration: Option<DateTime<Utc>>,
    config: &RenewalConfig,
    now: DateTime<Utc>,
) -> Duration {
    let Some(expires_at) = expiration else {
        return config.fallback_period();
    };

    let remaining = (expires_at - now).to_std().unwrap_or(Duration::ZERO);
    let lead = config.lead();

    if remaining > lead {
        remaining - lead
    } else {
        remaining / 2
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    use super::*;

    fn config() -> RenewalConfig {
        RenewalConfig { lead_secs: 600, fallback_period_secs: 5400 }
    }

    #[test]
    fn delay_leaves_lead_time_before_expiry() {
        let now = Utc::now();
        let delay = renewal_delay(Some(now + chrono::Duration::hours(1)), &config(), now);
        assert_eq!(delay, Duration::from_secs(3000));
    }

    #[test]
    fn delay_halves_short_validity() {
        let now = Utc::now();
        let delay = renewal_delay(Some(now + chrono::Duration::minutes(4)), &config(), now);
        assert_eq!(delay, Duration::from_secs(120));
    }

    #[test]
    fn delay_is_zero_for_past_expiry() {
        let now = Utc::now();
        let delay = renewal_delay(Some(now - chrono::Duration::minutes(1)), &config(), now);
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn delay_falls_back_without_expiry() {
        assert_eq!(renewal_delay(None, &config(), Utc::now()), Duration::from_secs(5400));
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let timer = RenewalTimer::arm(Duration::from_secs(60), move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timer.is_pending());

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let timer = RenewalTimer::arm(Duration::from_secs(10), move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        timer.cancel();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        {
            let _timer = RenewalTimer::arm(Duration::from_secs(10), move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn renewal_receives_its_timer_id() {
        let seen = Arc::new(AtomicU64::new(0));
        let slot = Arc::clone(&seen);

        let timer = RenewalTimer::arm(Duration::from_secs(1), move |id| async move {
            slot.store(id, Ordering::SeqCst);
        });
        let id = timer.id();

        tokio::time::sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(seen.load(Ordering::SeqCst), id);
    }
}
