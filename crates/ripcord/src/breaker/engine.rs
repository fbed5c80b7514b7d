// Copyright (c) The Ripcord Project Authors.

use std::sync::Mutex;
use std::time::Instant;

use tick::Clock;

use super::{BreakerOptions, CallOutcome, SlidingWindow};
use crate::utils::ERR_POISONED_LOCK;

/// The admission decision returned by [`CircuitBreaker::allow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may proceed.
    Admitted,
    /// The call must not proceed.
    Rejected,
}

/// A state change performed by the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The failure rate crossed the threshold; the breaker opened.
    Opened,
    /// The open wait elapsed; trial calls are now admitted.
    HalfOpened,
    /// Every trial call succeeded; the breaker closed.
    Closed,
    /// A trial call failed; the breaker reopened.
    Reopened,
}

/// The externally visible state of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum BreakerState {
    /// Calls flow normally while outcomes are tracked.
    Closed,
    /// Calls are rejected outright.
    Open,
    /// A limited number of trial calls are admitted.
    HalfOpen,
}

/// A point-in-time snapshot of a breaker, for dashboards and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BreakerStatus {
    /// The current state.
    pub state: BreakerState,
    /// Successes observed in the current window (closed) or among trial
    /// calls (half-open).
    pub successes: u32,
    /// Failures observed in the current window.
    pub failures: u32,
    /// Total calls rejected since creation or the last reset.
    pub rejected_calls: u64,
}

/// A circuit breaker protecting one downstream resource.
///
/// See the [module docs][crate::breaker] for the state machine and usage.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    inner: Mutex<Inner>,
    options: BreakerOptions,
    clock: Clock,
}

#[derive(Debug)]
struct Inner {
    state: State,
    rejected: u64,
}

impl CircuitBreaker {
    /// Creates a closed breaker with an empty window.
    #[must_use]
    pub fn new(name: impl Into<String>, options: BreakerOptions, clock: &Clock) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(Inner {
                state: State::Closed {
                    window: SlidingWindow::new(options.window_size()),
                },
                rejected: 0,
            }),
            options,
            clock: clock.clone(),
        }
    }

    /// The name this breaker was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decides whether a call may proceed right now.
    ///
    /// An admitted call must be followed by exactly one
    /// [`record`][Self::record] with the call's outcome.
    #[must_use]
    pub fn allow(&self) -> Admission {
        let now = self.clock.instant();

        // NOTE: Remember to execute all expensive operations (like time checks) outside the lock.
        let (admission, transition) = {
            let mut inner = self.inner.lock().expect(ERR_POISONED_LOCK);
            let (admission, transition) = inner.state.allow(now, &self.options);
            if admission == Admission::Rejected {
                inner.rejected = inner.rejected.saturating_add(1);
            }
            (admission, transition)
        };

        if let Some(transition) = transition {
            self.trace_transition(transition);
        }

        admission
    }

    /// Records the outcome of an admitted call.
    ///
    /// Outcomes arriving while the breaker is open are dropped: the call was
    /// admitted under an earlier state and its result no longer carries
    /// information about the current one.
    pub fn record(&self, outcome: CallOutcome) {
        let now = self.clock.instant();

        // NOTE: Remember to execute all expensive operations (like time checks) outside the lock.
        let transition = self
            .inner
            .lock()
            .expect(ERR_POISONED_LOCK)
            .state
            .record(outcome, now, &self.options);

        if let Some(transition) = transition {
            self.trace_transition(transition);
        }
    }

    /// Forces the breaker back to closed with an empty window and clears the
    /// rejection counter.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect(ERR_POISONED_LOCK);
        inner.state = State::Closed {
            window: SlidingWindow::new(self.options.window_size()),
        };
        inner.rejected = 0;
    }

    /// Returns a snapshot of the breaker's current state and counters.
    #[must_use]
    pub fn status(&self) -> BreakerStatus {
        let inner = self.inner.lock().expect(ERR_POISONED_LOCK);

        match &inner.state {
            State::Closed { window } => BreakerStatus {
                state: BreakerState::Closed,
                successes: window.successes(),
                failures: window.failures(),
                rejected_calls: inner.rejected,
            },
            State::Open { .. } => BreakerStatus {
                state: BreakerState::Open,
                successes: 0,
                failures: 0,
                rejected_calls: inner.rejected,
            },
            State::HalfOpen { successes, .. } => BreakerStatus {
                state: BreakerState::HalfOpen,
                successes: *successes,
                failures: 0,
                rejected_calls: inner.rejected,
            },
        }
    }

    fn trace_transition(&self, transition: Transition) {
        #[cfg(any(feature = "logs", test))]
        tracing::debug!(
            breaker = %self.name,
            transition = ?transition,
            "circuit breaker changed state"
        );

        #[cfg(not(any(feature = "logs", test)))]
        let _ = (self, transition);
    }
}

#[derive(Debug)]
enum State {
    Closed { window: SlidingWindow },
    Open { until: Instant },
    HalfOpen { permits_left: u32, successes: u32 },
}

impl State {
    fn allow(&mut self, now: Instant, options: &BreakerOptions) -> (Admission, Option<Transition>) {
        match self {
            Self::Closed { .. } => (Admission::Admitted, None),
            Self::Open { until } => {
                if now >= *until {
                    // The transition consumes the first trial permit.
                    *self = Self::HalfOpen {
                        permits_left: options.permitted_calls().saturating_sub(1),
                        successes: 0,
                    };
                    (Admission::Admitted, Some(Transition::HalfOpened))
                } else {
                    (Admission::Rejected, None)
                }
            }
            Self::HalfOpen { permits_left, .. } => {
                if *permits_left == 0 {
                    (Admission::Rejected, None)
                } else {
                    *permits_left -= 1;
                    (Admission::Admitted, None)
                }
            }
        }
    }

    fn record(
        &mut self,
        outcome: CallOutcome,
        now: Instant,
        options: &BreakerOptions,
    ) -> Option<Transition> {
        match self {
            Self::Closed { window } => {
                window.record(outcome);

                // The rate is only meaningful once the window is full.
                if window.is_full() && window.failure_rate() >= options.threshold() {
                    *self = Self::Open {
                        until: now + options.wait_duration(),
                    };
                    return Some(Transition::Opened);
                }

                None
            }
            Self::Open { .. } => {
                // The state changed between allow and record; ignore the
                // late result.
                None
            }
            Self::HalfOpen { successes, .. } => match outcome {
                CallOutcome::Failure => {
                    *self = Self::Open {
                        until: now + options.wait_duration(),
                    };
                    Some(Transition::Reopened)
                }
                CallOutcome::Success => {
                    *successes += 1;
                    if *successes >= options.permitted_calls() {
                        *self = Self::Closed {
                            window: SlidingWindow::new(options.window_size()),
                        };
                        return Some(Transition::Closed);
                    }

                    None
                }
            },
        }
    }
}
