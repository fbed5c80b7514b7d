// Copyright (c) The Ripcord Project Authors.
// Licensed under the MIT License.

//! Resilience policies for calling unreliable dependencies.
//!
//! This crate composes three classic resilience patterns into named,
//! process-wide execution pipelines:
//!
//! - [`CircuitBreaker`][breaker::CircuitBreaker]: stops calling a dependency
//!   whose recent failure rate crossed a threshold, probing it again after a
//!   cooling-off period.
//! - [`RateLimiter`][limiter::RateLimiter]: bounds the call rate to a
//!   dependency with a fixed-window permit budget.
//! - [`RetryPolicy`][retry::RetryPolicy] / [`RetryExecutor`][retry::RetryExecutor]:
//!   re-attempts transient failures with capped geometric backoff, guided by
//!   a per-error [`RecoveryInfo`] classification.
//!
//! A [`Pipeline`][pipeline::Pipeline] binds these stages together in a fixed
//! order (rate limiter, then breaker, then retry around the operation) with
//! an optional fallback for terminal failures, and a [`Registry`] holds the
//! named pipelines and policy instances for the process lifetime.
//!
//! # Runtime Agnostic Design
//!
//! All time handling (breaker cool-off, limiter windows, backoff delays,
//! deadlines) goes through [`Clock`][tick::Clock] from the [`tick`] crate, so
//! the crate works on any async runtime and every time-dependent behavior is
//! deterministic under test.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//!
//! use ripcord::breaker::BreakerOptions;
//! use ripcord::limiter::LimiterOptions;
//! use ripcord::pipeline::Pipeline;
//! use ripcord::retry::{RetryOptions, RetryPolicy};
//! use ripcord::{ExecutionError, RecoveryInfo, RegistryBuilder};
//! use tick::Clock;
//!
//! # async fn run(clock: Clock) {
//! let mut builder = RegistryBuilder::new(&clock);
//!
//! let breaker = builder.circuit_breaker(
//!     "payments-api",
//!     BreakerOptions::new()
//!         .sliding_window_size(20)
//!         .failure_rate_threshold(50.0)
//!         .wait_duration_in_open_state(Duration::from_secs(10)),
//! );
//! let limiter = builder.rate_limiter(
//!     "payments-api",
//!     LimiterOptions::new().limit_for_period(100),
//! );
//!
//! builder.pipeline(
//!     Pipeline::builder("charge", &clock)
//!         .rate_limiter(limiter)
//!         .circuit_breaker(breaker)
//!         .retry(RetryPolicy::new(
//!             RetryOptions::new()
//!                 .max_attempts(3)
//!                 .base_delay(Duration::from_millis(200)),
//!             |error: &String| {
//!                 if error.contains("timeout") {
//!                     RecoveryInfo::retry()
//!                 } else {
//!                     RecoveryInfo::never()
//!                 }
//!             },
//!         ))
//!         .fallback(|_error| Ok("queued for later".to_string()))
//!         .build(),
//! );
//!
//! let registry = builder.build();
//! let result = registry.execute("charge", || async { charge().await }).await;
//! # let _ = result;
//! # }
//! # async fn charge() -> Result<String, String> { Ok("charged".to_string()) }
//! ```
//!
//! # Observability
//!
//! The engine never formats logs or pushes metrics itself. Register an
//! [`on_outcome`][pipeline::PipelineBuilder::on_outcome] hook to observe
//! admission decisions and attempt results, and enable the `logs` feature
//! for [`tracing`] events on breaker state changes and retry backoff.
//!
//! # Features
//!
//! - `logs`: emit [`tracing`] events from the policy engines.
//! - `serde`: `Serialize`/`Deserialize` for option types and status
//!   snapshots.

mod attempt;
mod error;
mod outcome;
mod registry;
mod rnd;
mod utils;

pub mod breaker;
pub mod limiter;
pub mod pipeline;
pub mod retry;

pub use attempt::Attempt;
pub use error::{ErrorKind, ExecutionError};
pub use outcome::{OutcomeEvent, Stage, StageOutcome};
pub use recoverable::{Recovery, RecoveryInfo, RecoveryKind};
pub use registry::{PolicyStatus, Registry, RegistryBuilder};
