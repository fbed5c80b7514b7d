// Copyright (c) The Ripcord Project Authors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tick::Clock;

use crate::breaker::{BreakerOptions, BreakerStatus, CircuitBreaker};
use crate::error::ExecutionError;
use crate::limiter::{LimiterOptions, LimiterStatus, RateLimiter};
use crate::pipeline::Pipeline;

/// A point-in-time snapshot of the policies registered under one name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PolicyStatus {
    /// Snapshot of the breaker under this name, if one is registered.
    pub breaker: Option<BreakerStatus>,
    /// Snapshot of the limiter under this name, if one is registered.
    pub limiter: Option<LimiterStatus>,
}

/// Builder populating a [`Registry`] at startup.
///
/// Policies are created here once per named resource and shared by handle;
/// the built registry is read-only thereafter.
///
/// `T` is the success type of the protected operations, `E` their error type.
#[derive(Debug)]
pub struct RegistryBuilder<T, E> {
    clock: Clock,
    breakers: HashMap<String, Arc<CircuitBreaker>>,
    limiters: HashMap<String, Arc<RateLimiter>>,
    pipelines: HashMap<String, Pipeline<T, E>>,
}

impl<T, E> RegistryBuilder<T, E> {
    /// Creates an empty builder whose policies run on the given clock.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            breakers: HashMap::new(),
            limiters: HashMap::new(),
            pipelines: HashMap::new(),
        }
    }

    /// The clock the registry's policies run on.
    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Creates a circuit breaker under `name` and returns a shared handle to
    /// it. Registering the same name again replaces the previous instance.
    pub fn circuit_breaker(
        &mut self,
        name: impl Into<String>,
        options: BreakerOptions,
    ) -> Arc<CircuitBreaker> {
        let name = name.into();
        let breaker = Arc::new(CircuitBreaker::new(name.clone(), options, &self.clock));
        self.breakers.insert(name, Arc::clone(&breaker));
        breaker
    }

    /// Creates a rate limiter under `name` and returns a shared handle to it.
    /// Registering the same name again replaces the previous instance.
    pub fn rate_limiter(
        &mut self,
        name: impl Into<String>,
        options: LimiterOptions,
    ) -> Arc<RateLimiter> {
        let name = name.into();
        let limiter = Arc::new(RateLimiter::new(name.clone(), options, &self.clock));
        self.limiters.insert(name, Arc::clone(&limiter));
        limiter
    }

    /// Registers a pipeline under its own name.
    pub fn pipeline(&mut self, pipeline: Pipeline<T, E>) {
        self.pipelines.insert(pipeline.name().to_string(), pipeline);
    }

    /// Finishes the registry.
    #[must_use]
    pub fn build(self) -> Registry<T, E> {
        Registry {
            breakers: self.breakers,
            limiters: self.limiters,
            pipelines: self.pipelines,
        }
    }
}

/// Process-wide, read-only lookup of named pipelines and their policies.
///
/// Built once at startup via [`RegistryBuilder`]; the policy instances live
/// for the process lifetime and are only ever [`reset`][Self::reset], never
/// destroyed or reconfigured.
///
/// # Examples
///
/// ```
/// use ripcord::breaker::BreakerOptions;
/// use ripcord::pipeline::Pipeline;
/// use ripcord::{ExecutionError, RegistryBuilder};
/// use tick::Clock;
///
/// # async fn demo(clock: &Clock) -> Result<String, ExecutionError<String>> {
/// let mut builder = RegistryBuilder::new(clock);
/// let breaker = builder.circuit_breaker("backend", BreakerOptions::new());
/// builder.pipeline(
///     Pipeline::builder("orders", clock)
///         .circuit_breaker(breaker)
///         .build(),
/// );
/// let registry = builder.build();
///
/// registry.execute("orders", || async { fetch_order().await }).await
/// # }
/// # async fn fetch_order() -> Result<String, String> { Ok("order".to_string()) }
/// ```
#[derive(Debug)]
pub struct Registry<T, E> {
    breakers: HashMap<String, Arc<CircuitBreaker>>,
    limiters: HashMap<String, Arc<RateLimiter>>,
    pipelines: HashMap<String, Pipeline<T, E>>,
}

impl<T, E> Registry<T, E> {
    /// Runs `operation` under the named pipeline.
    ///
    /// Resolves to [`ExecutionError::UnknownPipeline`] when no pipeline is
    /// registered under `pipeline`.
    pub async fn execute<F, Fut>(&self, pipeline: &str, operation: F) -> Result<T, ExecutionError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(found) = self.pipelines.get(pipeline) else {
            return Err(ExecutionError::UnknownPipeline(pipeline.to_string()));
        };

        found.execute(operation).await
    }

    /// Runs `operation` under the named pipeline, bounded by a deadline
    /// covering the whole execution.
    pub async fn execute_with_deadline<F, Fut>(
        &self,
        pipeline: &str,
        deadline: Duration,
        operation: F,
    ) -> Result<T, ExecutionError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(found) = self.pipelines.get(pipeline) else {
            return Err(ExecutionError::UnknownPipeline(pipeline.to_string()));
        };

        found.execute_with_deadline(deadline, operation).await
    }

    /// Looks up a pipeline by name, for call-sites that want to hold a
    /// direct reference.
    #[must_use]
    pub fn pipeline(&self, name: &str) -> Option<&Pipeline<T, E>> {
        self.pipelines.get(name)
    }

    /// Administrative reset of the breaker and/or limiter registered under
    /// `name`: counters zeroed, state forced back to the initial one.
    ///
    /// Returns `false` when no policy is registered under `name`.
    pub fn reset(&self, name: &str) -> bool {
        let breaker = self.breakers.get(name);
        let limiter = self.limiters.get(name);

        if let Some(breaker) = breaker {
            breaker.reset();
        }
        if let Some(limiter) = limiter {
            limiter.reset();
        }

        breaker.is_some() || limiter.is_some()
    }

    /// Read-only introspection of the policies registered under `name`, or
    /// `None` when nothing is registered under it.
    #[must_use]
    pub fn status(&self, name: &str) -> Option<PolicyStatus> {
        let breaker = self.breakers.get(name).map(|breaker| breaker.status());
        let limiter = self.limiters.get(name).map(|limiter| limiter.status());

        if breaker.is_none() && limiter.is_none() {
            return None;
        }

        Some(PolicyStatus { breaker, limiter })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::breaker::{BreakerState, CallOutcome};

    static_assertions::assert_impl_all!(Registry<String, String>: Send, Sync);

    fn build_registry(clock: &Clock) -> Registry<u32, String> {
        let mut builder = RegistryBuilder::new(clock);
        let breaker = builder.circuit_breaker(
            "backend",
            BreakerOptions::new()
                .sliding_window_size(2)
                .failure_rate_threshold(50.0),
        );
        let limiter = builder.rate_limiter("backend", LimiterOptions::new().limit_for_period(2));
        builder.pipeline(
            Pipeline::builder("orders", clock)
                .rate_limiter(limiter)
                .circuit_breaker(breaker)
                .build(),
        );
        builder.build()
    }

    #[tokio::test]
    async fn executes_by_pipeline_name() {
        let clock = Clock::new_frozen();
        let registry = build_registry(&clock);

        let result = registry.execute("orders", || async { Ok(5) }).await;

        assert_eq!(result, Ok(5));
    }

    #[tokio::test]
    async fn unknown_pipeline_is_a_tagged_error() {
        let clock = Clock::new_frozen();
        let registry = build_registry(&clock);
        let calls = AtomicU32::new(0);

        let result = registry
            .execute("missing", || {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Ok(5) }
            })
            .await;

        assert_eq!(result, Err(ExecutionError::UnknownPipeline("missing".to_string())));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn reset_clears_breaker_and_limiter_under_one_name() {
        let clock = Clock::new_frozen();
        let registry = build_registry(&clock);

        // Exhaust the limiter and trip the breaker through the pipeline.
        let _ = registry.execute("orders", || async { Err::<u32, _>("down".to_string()) }).await;
        let _ = registry.execute("orders", || async { Err::<u32, _>("down".to_string()) }).await;
        let _ = registry.execute("orders", || async { Ok(1) }).await;

        let status = registry.status("backend").unwrap();
        assert_eq!(status.breaker.unwrap().state, BreakerState::Open);
        assert_eq!(status.limiter.unwrap().available_permits, 0);

        assert!(registry.reset("backend"));

        let status = registry.status("backend").unwrap();
        assert_eq!(status.breaker.unwrap().state, BreakerState::Closed);
        assert_eq!(status.limiter.unwrap().available_permits, 2);
    }

    #[test]
    fn reset_of_unknown_name_reports_false() {
        let clock = Clock::new_frozen();
        let registry = build_registry(&clock);

        assert!(!registry.reset("missing"));
    }

    #[test]
    fn status_of_unknown_name_is_none() {
        let clock = Clock::new_frozen();
        let registry = build_registry(&clock);

        assert!(registry.status("missing").is_none());
    }

    #[test]
    fn status_reflects_recorded_outcomes() {
        let clock = Clock::new_frozen();
        let mut builder: RegistryBuilder<u32, String> = RegistryBuilder::new(&clock);
        let breaker = builder.circuit_breaker("backend", BreakerOptions::new());
        let registry = builder.build();

        breaker.allow();
        breaker.record(CallOutcome::Success);

        let status = registry.status("backend").unwrap();
        assert_eq!(status.breaker.unwrap().successes, 1);
        assert!(status.limiter.is_none());
    }
}
