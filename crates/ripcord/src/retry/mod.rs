// Copyright (c) The Ripcord Project Authors.

//! Retry: a bounded attempt loop with backoff.
//!
//! A [`RetryPolicy`] pairs attempt/backoff configuration with a classifier
//! that inspects each failure and returns a [`RecoveryInfo`][recoverable::RecoveryInfo]
//! verdict. Only failures classified as [`RecoveryKind::Retry`][recoverable::RecoveryKind::Retry]
//! are attempted again; anything else is terminal on first occurrence. A
//! classifier may also carry an explicit delay hint (for example from a
//! `Retry-After` header), which takes precedence over the computed backoff
//! for that step.
//!
//! Backoff between attempts grows geometrically:
//! `base_delay * backoff_multiplier^(attempt - 1)`, capped at
//! [`max_delay`][RetryOptions::max_delay], with optional symmetric jitter to
//! spread synchronized callers apart.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use recoverable::RecoveryInfo;
//! use ripcord::retry::{RetryExecutor, RetryOptions, RetryPolicy};
//! use tick::Clock;
//!
//! # async fn demo(clock: &Clock) -> Result<String, ripcord::retry::RetryError<String>> {
//! let policy = RetryPolicy::new(
//!     RetryOptions::new()
//!         .max_attempts(4)
//!         .base_delay(Duration::from_millis(100))
//!         .backoff_multiplier(2.0)
//!         .max_delay(Duration::from_secs(1)),
//!     |_error: &String| RecoveryInfo::retry(),
//! );
//!
//! let executor = RetryExecutor::new(clock);
//! executor
//!     .execute(&policy, |attempt| async move {
//!         fetch(attempt.number()).await
//!     })
//!     .await
//! # }
//! # async fn fetch(attempt: u32) -> Result<String, String> { Ok(format!("{attempt}")) }
//! ```

mod backoff;
mod executor;
mod policy;

pub use executor::{RetryError, RetryExecutor};
pub use policy::{RetryOptions, RetryPolicy};
