// Copyright (c) The Ripcord Project Authors.

//! Circuit breaker: a per-resource failure-rate state machine.
//!
//! A [`CircuitBreaker`] protects a downstream resource by tracking the
//! outcomes of recent calls in a count-based sliding window. When the
//! observed failure rate reaches the configured threshold, the breaker
//! *opens* and rejects calls outright, giving the resource time to recover.
//! After [`wait_duration_in_open_state`][BreakerOptions::wait_duration_in_open_state]
//! the breaker admits a limited number of trial calls (*half-open*); if every
//! trial succeeds the breaker closes again, while a single trial failure
//! reopens it immediately.
//!
//! The breaker is consulted with [`allow`][CircuitBreaker::allow] before the
//! protected operation runs, and informed of the result with
//! [`record`][CircuitBreaker::record] afterwards. Both calls take a narrow
//! internal lock held only for the state transition; the protected operation
//! itself always runs outside any lock.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use ripcord::breaker::{Admission, BreakerOptions, CallOutcome, CircuitBreaker};
//! use tick::Clock;
//!
//! # fn demo(clock: &Clock) {
//! let breaker = CircuitBreaker::new(
//!     "backend",
//!     BreakerOptions::new()
//!         .sliding_window_size(5)
//!         .failure_rate_threshold(50.0)
//!         .wait_duration_in_open_state(Duration::from_secs(1))
//!         .permitted_calls_in_half_open(2),
//!     clock,
//! );
//!
//! if breaker.allow() == Admission::Admitted {
//!     // ... invoke the protected operation ...
//!     breaker.record(CallOutcome::Success);
//! }
//! # }
//! ```

mod engine;
mod options;
mod window;

pub use engine::{Admission, BreakerState, BreakerStatus, CircuitBreaker, Transition};
pub use options::BreakerOptions;
pub(crate) use window::SlidingWindow;

/// The observed result of one call to a protected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// The call completed successfully.
    Success,
    /// The call failed.
    Failure,
}
