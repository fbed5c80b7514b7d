// Copyright (c) The Ripcord Project Authors.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tick::Clock;

use super::LimiterOptions;
use crate::utils::ERR_POISONED_LOCK;

/// A point-in-time snapshot of a limiter, for dashboards and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LimiterStatus {
    /// Permits still available in the current window.
    pub available_permits: u32,
    /// Permits issued at the start of each window.
    pub limit_for_period: u32,
    /// Total acquisitions rejected since creation or the last reset.
    pub rejected_calls: u64,
}

/// A fixed-window rate limiter for one named resource.
///
/// See the [module docs][crate::limiter] for the windowing semantics.
#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    state: Mutex<PermitState>,
    options: LimiterOptions,
    clock: Clock,
}

#[derive(Debug)]
struct PermitState {
    available: u32,
    period_start: Instant,
    rejected: u64,
}

impl PermitState {
    /// Resets the budget when the current window has elapsed.
    fn refresh(&mut self, now: Instant, options: &LimiterOptions) {
        if now.saturating_duration_since(self.period_start) >= options.period() {
            self.available = options.limit();
            self.period_start = now;
        }
    }
}

impl RateLimiter {
    /// Creates a limiter with a full permit budget and a window starting now.
    #[must_use]
    pub fn new(name: impl Into<String>, options: LimiterOptions, clock: &Clock) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(PermitState {
                available: options.limit(),
                period_start: clock.instant(),
                rejected: 0,
            }),
            options,
            clock: clock.clone(),
        }
    }

    /// The name this limiter was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured maximum wait for a permit.
    #[must_use]
    pub fn timeout_duration(&self) -> Duration {
        self.options.wait()
    }

    /// Attempts to take a permit without waiting.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.instant();

        match self.try_acquire_at(now) {
            Ok(()) => true,
            Err(_) => {
                self.note_rejected();
                false
            }
        }
    }

    /// Takes a permit, waiting up to `wait` for the next window if the
    /// current budget is exhausted.
    ///
    /// With a zero `wait` this behaves like [`try_acquire`][Self::try_acquire].
    /// The wait suspends on the limiter's clock, so it is cancellable by
    /// dropping the returned future.
    pub async fn acquire(&self, wait: Duration) -> bool {
        let deadline = if wait.is_zero() {
            None
        } else {
            Some(self.clock.instant() + wait)
        };

        loop {
            let now = self.clock.instant();

            let retry_at = match self.try_acquire_at(now) {
                Ok(()) => return true,
                Err(retry_at) => retry_at,
            };

            let Some(deadline) = deadline else {
                self.note_rejected();
                return false;
            };

            if now >= deadline {
                self.note_rejected();
                return false;
            }

            // Sleep to whichever comes first: the next window boundary or the
            // caller's deadline, then contend for a permit again.
            let wake_at = retry_at.min(deadline);
            self.clock.delay(wake_at.saturating_duration_since(now)).await;
        }
    }

    /// Refills the budget, restarts the window, and clears the rejection
    /// counter.
    pub fn reset(&self) {
        let now = self.clock.instant();

        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
        state.available = self.options.limit();
        state.period_start = now;
        state.rejected = 0;
    }

    /// Returns a snapshot of the limiter's current budget and counters.
    #[must_use]
    pub fn status(&self) -> LimiterStatus {
        let now = self.clock.instant();

        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
        state.refresh(now, &self.options);

        LimiterStatus {
            available_permits: state.available,
            limit_for_period: self.options.limit(),
            rejected_calls: state.rejected,
        }
    }

    /// Takes a permit if one is available at `now`, otherwise reports when
    /// the next window opens.
    fn try_acquire_at(&self, now: Instant) -> Result<(), Instant> {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
        state.refresh(now, &self.options);

        if state.available > 0 {
            state.available -= 1;
            Ok(())
        } else {
            Err(state.period_start + self.options.period())
        }
    }

    fn note_rejected(&self) {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
        state.rejected = state.rejected.saturating_add(1);
        drop(state);

        #[cfg(any(feature = "logs", test))]
        tracing::debug!(limiter = %self.name, "rate limiter rejected a call");
    }
}

#[cfg(test)]
mod tests {
    use tick::ClockControl;

    use super::*;

    static_assertions::assert_impl_all!(RateLimiter: Send, Sync);
    static_assertions::assert_impl_all!(LimiterStatus: Send, Sync, Copy);

    fn test_options() -> LimiterOptions {
        LimiterOptions::new()
            .limit_for_period(3)
            .limit_refresh_period(Duration::from_secs(1))
    }

    #[test]
    fn permits_exhaust_within_one_window() {
        let clock = Clock::new_frozen();
        let limiter = RateLimiter::new("test", test_options(), &clock);

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn budget_refreshes_at_period_boundary() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let limiter = RateLimiter::new("test", test_options(), &clock);

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());

        control.advance(Duration::from_millis(999));
        assert!(!limiter.try_acquire());

        control.advance(Duration::from_millis(1));
        assert!(limiter.try_acquire());
    }

    #[test]
    fn permits_do_not_bank_across_idle_periods() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let limiter = RateLimiter::new("test", test_options(), &clock);

        // Several idle windows pass; the budget is still just one window's worth.
        control.advance(Duration::from_secs(10));

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn rejections_are_counted() {
        let clock = Clock::new_frozen();
        let limiter = RateLimiter::new("test", test_options(), &clock);

        for _ in 0..3 {
            limiter.try_acquire();
        }
        assert!(!limiter.try_acquire());
        assert!(!limiter.try_acquire());

        assert_eq!(limiter.status().rejected_calls, 2);
    }

    #[test]
    fn reset_refills_budget() {
        let clock = Clock::new_frozen();
        let limiter = RateLimiter::new("test", test_options(), &clock);

        for _ in 0..3 {
            limiter.try_acquire();
        }
        assert!(!limiter.try_acquire());

        limiter.reset();

        let status = limiter.status();
        assert_eq!(status.available_permits, 3);
        assert_eq!(status.rejected_calls, 0);
        assert!(limiter.try_acquire());
    }

    #[test]
    fn status_reflects_lazy_refresh() {
        let control = ClockControl::new();
        let clock = control.to_clock();
        let limiter = RateLimiter::new("test", test_options(), &clock);

        for _ in 0..3 {
            limiter.try_acquire();
        }
        assert_eq!(limiter.status().available_permits, 0);

        control.advance(Duration::from_secs(1));
        assert_eq!(limiter.status().available_permits, 3);
    }

    #[test]
    fn acquire_suspends_while_the_budget_is_exhausted() {
        use futures::FutureExt as _;

        let control = ClockControl::new();
        let clock = control.to_clock();
        let limiter = RateLimiter::new("test", test_options(), &clock);

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }

        // Time is not advancing, so the wait never resolves.
        assert!(limiter.acquire(Duration::from_secs(5)).now_or_never().is_none());
    }

    #[tokio::test]
    async fn acquire_with_zero_wait_rejects_immediately() {
        let clock = Clock::new_frozen();
        let limiter = RateLimiter::new("test", test_options(), &clock);

        for _ in 0..3 {
            assert!(limiter.acquire(Duration::ZERO).await);
        }
        assert!(!limiter.acquire(Duration::ZERO).await);
    }

    #[tokio::test]
    async fn acquire_waits_for_the_next_window() {
        let clock = ClockControl::default().auto_advance_timers(true).to_clock();
        let limiter = RateLimiter::new("test", test_options(), &clock);

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }

        // The budget is gone, but the wait spans the window boundary.
        assert!(limiter.acquire(Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn acquire_gives_up_when_wait_is_too_short() {
        let clock = ClockControl::default().auto_advance_timers(true).to_clock();
        let limiter = RateLimiter::new("test", test_options(), &clock);

        for _ in 0..3 {
            assert!(limiter.try_acquire());
        }

        // The wait ends before the 1s window boundary.
        assert!(!limiter.acquire(Duration::from_millis(500)).await);
        assert_eq!(limiter.status().rejected_calls, 1);
    }
}
