// Copyright (c) The Ripcord Project Authors.

use std::time::Duration;

use recoverable::RecoveryKind;
use thiserror::Error;
use tick::Clock;

use super::RetryPolicy;
use crate::Attempt;

/// A terminal failure of a retry loop.
///
/// `E` is the error type of the operation being retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The classifier declared the failure terminal; no further attempts
    /// were made.
    #[error("operation failed with a non-retryable error")]
    NonRetryable(E),

    /// A retryable failure persisted through every permitted attempt.
    #[error("operation failed after {attempts} attempts")]
    Exhausted {
        /// How many times the operation was invoked.
        attempts: u32,
        /// The error returned by the final attempt.
        error: E,
    },
}

/// Drives a [`RetryPolicy`] against an async operation.
///
/// The executor holds only a clock; all per-invocation state (attempt number,
/// backoff position) lives on the stack of [`execute`][Self::execute], so one
/// executor serves any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    clock: Clock,
}

impl RetryExecutor {
    /// Creates an executor that suspends on the given clock.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self { clock: clock.clone() }
    }

    /// Invokes `operation` until it succeeds, fails terminally, or the
    /// attempt budget is spent.
    ///
    /// The operation receives the current [`Attempt`] so it can adjust
    /// behavior on the last try. Between retryable failures the executor
    /// suspends for the policy's backoff delay, or for the classifier's
    /// explicit delay hint when one is present. The suspension runs on the
    /// executor's clock and is cancellable by dropping the returned future.
    pub async fn execute<T, E, F, Fut>(
        &self,
        policy: &RetryPolicy<E>,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut(Attempt) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = policy.max_attempts();
        let mut attempt = Attempt::first(max_attempts);
        let mut delays = policy.delays();

        loop {
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let recovery = policy.classify(&error);
            if !matches!(recovery.kind(), RecoveryKind::Retry) {
                return Err(RetryError::NonRetryable(error));
            }

            let Some(next) = attempt.increment(max_attempts) else {
                return Err(RetryError::Exhausted {
                    attempts: attempt.number(),
                    error,
                });
            };

            // An explicit hint from the classifier wins over computed backoff.
            let delay = recovery
                .get_delay()
                .unwrap_or_else(|| delays.next().unwrap_or(Duration::ZERO));

            trace_backoff(next, delay);

            if !delay.is_zero() {
                self.clock.delay(delay).await;
            }

            attempt = next;
        }
    }
}

fn trace_backoff(attempt: Attempt, delay: Duration) {
    #[cfg(any(feature = "logs", test))]
    tracing::debug!(
        attempt = attempt.number(),
        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
        "retrying after backoff"
    );

    #[cfg(not(any(feature = "logs", test)))]
    let _ = (attempt, delay);
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use recoverable::RecoveryInfo;
    use tick::ClockControl;

    use super::*;
    use crate::retry::RetryOptions;

    static_assertions::assert_impl_all!(RetryExecutor: Send, Sync, Clone);

    fn always_retry() -> RetryPolicy<String> {
        RetryPolicy::new(RetryOptions::new().base_delay(Duration::from_millis(100)), |_| {
            RecoveryInfo::retry()
        })
    }

    #[tokio::test]
    async fn first_success_makes_one_attempt() {
        let clock = Clock::new_frozen();
        let executor = RetryExecutor::new(&clock);
        let calls = AtomicU32::new(0);

        let result = executor
            .execute(&always_retry(), |_| {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Ok::<_, String>(42) }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn persistent_retryable_failure_exhausts_budget() {
        let clock = ClockControl::default().auto_advance_timers(true).to_clock();
        let executor = RetryExecutor::new(&clock);
        let calls = AtomicU32::new(0);

        let result: Result<u32, _> = executor
            .execute(&always_retry(), |_| {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Err("down".to_string()) }
            })
            .await;

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                error: "down".to_string(),
            })
        );
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn non_retryable_failure_stops_after_one_attempt() {
        let clock = Clock::new_frozen();
        let executor = RetryExecutor::new(&clock);
        let policy = RetryPolicy::new(RetryOptions::new().max_attempts(5), |_: &String| {
            RecoveryInfo::never()
        });
        let calls = AtomicU32::new(0);

        let result: Result<u32, _> = executor
            .execute(&policy, |_| {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Err("bad request".to_string()) }
            })
            .await;

        assert_eq!(result, Err(RetryError::NonRetryable("bad request".to_string())));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn success_after_transient_failures() {
        let clock = ClockControl::default().auto_advance_timers(true).to_clock();
        let executor = RetryExecutor::new(&clock);
        let calls = AtomicU32::new(0);

        let result = executor
            .execute(&always_retry(), |_| {
                let call = calls.fetch_add(1, Ordering::Relaxed);
                async move {
                    if call < 2 {
                        Err("glitch".to_string())
                    } else {
                        Ok("recovered")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("recovered"));
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn attempts_are_numbered_and_flag_the_last() {
        let clock = ClockControl::default().auto_advance_timers(true).to_clock();
        let executor = RetryExecutor::new(&clock);
        let seen = Mutex::new(Vec::new());

        let _: Result<u32, _> = executor
            .execute(&always_retry(), |attempt| {
                seen.lock().unwrap().push((attempt.number(), attempt.is_last()));
                async { Err("down".to_string()) }
            })
            .await;

        assert_eq!(*seen.lock().unwrap(), vec![(1, false), (2, false), (3, true)]);
    }

    #[tokio::test]
    async fn backoff_delays_grow_geometrically() {
        let control = ClockControl::new().auto_advance_timers(true);
        let clock = control.to_clock();
        let executor = RetryExecutor::new(&clock);
        let policy = RetryPolicy::new(
            RetryOptions::new()
                .max_attempts(3)
                .base_delay(Duration::from_millis(100))
                .backoff_multiplier(2.0),
            |_: &String| RecoveryInfo::retry(),
        );

        let start = clock.instant();
        let _: Result<u32, _> = executor
            .execute(&policy, |_| async { Err("down".to_string()) })
            .await;

        // Two waits: 100ms then 200ms.
        assert_eq!(clock.instant() - start, Duration::from_millis(300));
    }

    #[tokio::test]
    async fn classifier_delay_hint_overrides_backoff() {
        let control = ClockControl::new().auto_advance_timers(true);
        let clock = control.to_clock();
        let executor = RetryExecutor::new(&clock);
        let policy = RetryPolicy::new(
            RetryOptions::new()
                .max_attempts(2)
                .base_delay(Duration::from_secs(10)),
            |_: &String| RecoveryInfo::retry().delay(Duration::from_millis(50)),
        );

        let start = clock.instant();
        let _: Result<u32, _> = executor
            .execute(&policy, |_| async { Err("throttled".to_string()) })
            .await;

        assert_eq!(clock.instant() - start, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn capped_delays_respect_max_delay() {
        let control = ClockControl::new().auto_advance_timers(true);
        let clock = control.to_clock();
        let executor = RetryExecutor::new(&clock);
        let policy = RetryPolicy::new(
            RetryOptions::new()
                .max_attempts(4)
                .base_delay(Duration::from_millis(100))
                .backoff_multiplier(10.0)
                .max_delay(Duration::from_millis(250)),
            |_: &String| RecoveryInfo::retry(),
        );

        let start = clock.instant();
        let _: Result<u32, _> = executor
            .execute(&policy, |_| async { Err("down".to_string()) })
            .await;

        // 100ms, then 250ms (capped from 1s), then 250ms (capped from 10s).
        assert_eq!(clock.instant() - start, Duration::from_millis(600));
    }

    #[tokio::test]
    async fn jittered_delays_are_deterministic_with_fixed_rnd() {
        let control = ClockControl::new().auto_advance_timers(true);
        let clock = control.to_clock();
        let executor = RetryExecutor::new(&clock);
        let policy = RetryPolicy::new(
            RetryOptions::new()
                .max_attempts(2)
                .base_delay(Duration::from_millis(1000))
                .backoff_multiplier(1.0)
                .use_jitter(true),
            |_: &String| RecoveryInfo::retry(),
        )
        .with_rnd(crate::rnd::Rnd::new_fixed(0.0));

        let start = clock.instant();
        let _: Result<u32, _> = executor
            .execute(&policy, |_| async { Err("down".to_string()) })
            .await;

        // With random value 0.0, jitter shifts the 1s delay to 0.75s.
        assert_eq!(clock.instant() - start, Duration::from_millis(750));
    }
}
