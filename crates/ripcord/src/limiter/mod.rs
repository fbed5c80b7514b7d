// Copyright (c) The Ripcord Project Authors.

//! Rate limiter: a fixed-window admission controller.
//!
//! A [`RateLimiter`] issues at most
//! [`limit_for_period`][LimiterOptions::limit_for_period] permits per
//! [`limit_refresh_period`][LimiterOptions::limit_refresh_period]. The permit
//! budget resets sharply at each period boundary and unused permits never
//! carry over, so bursts up to the full limit are possible at the start of a
//! window. This is deliberately a fixed-window counter rather than a token
//! bucket; callers wanting smoothing should front it with their own pacing.
//!
//! Permits are refreshed lazily on acquisition, not by a background timer:
//! a limiter that nobody calls costs nothing.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use ripcord::limiter::{LimiterOptions, RateLimiter};
//! use tick::Clock;
//!
//! # async fn demo(clock: &Clock) {
//! let limiter = RateLimiter::new(
//!     "ingest",
//!     LimiterOptions::new()
//!         .limit_for_period(100)
//!         .limit_refresh_period(Duration::from_secs(1)),
//!     clock,
//! );
//!
//! if limiter.acquire(Duration::from_millis(250)).await {
//!     // ... invoke the protected operation ...
//! }
//! # }
//! ```

mod engine;
mod options;

pub use engine::{LimiterStatus, RateLimiter};
pub use options::LimiterOptions;
