// Copyright (c) The Ripcord Project Authors.

//! Pipeline: ordered composition of the resilience policies.
//!
//! A [`Pipeline`] binds a rate limiter, a circuit breaker, a retry policy,
//! and an optional fallback into one execution unit for a call-site. The
//! stage order is fixed and meaningful:
//!
//! ```text
//! RateLimiter -> CircuitBreaker -> Retry -> operation
//! ```
//!
//! Admission control rejects excess traffic before it can affect breaker
//! statistics; the breaker gates availability before any attempt budget is
//! spent; retries apply only to the innermost operation call. Each stage can
//! short-circuit without invoking inner stages, and every terminal failure
//! passes through the fallback (when one is registered) exactly once.
//!
//! The pipeline itself is stateless: it delegates to the shared policy
//! instances it was built with, so one pipeline value serves any number of
//! concurrent calls.
//!
//! # Examples
//!
//! ```
//! use recoverable::RecoveryInfo;
//! use ripcord::ExecutionError;
//! use ripcord::pipeline::Pipeline;
//! use ripcord::retry::{RetryOptions, RetryPolicy};
//! use tick::Clock;
//!
//! # async fn demo(clock: &Clock) -> Result<String, ExecutionError<String>> {
//! let pipeline: Pipeline<String, String> = Pipeline::builder("orders", clock)
//!     .retry(RetryPolicy::new(RetryOptions::new(), |_| RecoveryInfo::retry()))
//!     .fallback(|_error| Ok("cached".to_string()))
//!     .build();
//!
//! pipeline.execute(|| async { fetch_order().await }).await
//! # }
//! # async fn fetch_order() -> Result<String, String> { Ok("fresh".to_string()) }
//! ```

use std::pin::pin;
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;

use tick::{Clock, FutureExt as _};

use crate::Attempt;
use crate::breaker::{Admission, CallOutcome, CircuitBreaker};
use crate::error::ExecutionError;
use crate::limiter::RateLimiter;
use crate::outcome::{OnOutcome, OutcomeEvent, Stage, StageOutcome};
use crate::retry::{RetryError, RetryExecutor, RetryPolicy};
use crate::utils::define_fn_wrapper;

define_fn_wrapper!(Fallback<T, E>(Fn(error: ExecutionError<E>) -> Result<T, ExecutionError<E>>));

/// One named execution unit composing the resilience policies.
///
/// `T` is the success type of the protected operations, `E` their error type.
/// Build instances with [`Pipeline::builder`].
#[derive(Debug, Clone)]
pub struct Pipeline<T, E> {
    name: String,
    limiter: Option<Arc<RateLimiter>>,
    breaker: Option<Arc<CircuitBreaker>>,
    retry: Arc<RetryPolicy<E>>,
    fallback: Option<Fallback<T, E>>,
    on_outcome: Option<OnOutcome>,
    executor: RetryExecutor,
    clock: Clock,
}

impl<T, E> Pipeline<T, E>
where
    E: 'static,
{
    /// Starts building a pipeline with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>, clock: &Clock) -> PipelineBuilder<T, E> {
        PipelineBuilder {
            name: name.into(),
            clock: clock.clone(),
            limiter: None,
            breaker: None,
            retry: None,
            fallback: None,
            on_outcome: None,
        }
    }
}

impl<T, E> Pipeline<T, E> {
    /// The name this pipeline was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs `operation` under this pipeline's policies.
    ///
    /// `operation` is a factory invoked once per attempt; each invocation
    /// must produce a fresh future. On success the value is returned and the
    /// fallback is never consulted. On any terminal failure the registered
    /// fallback (if any) receives the failure and its result is returned
    /// directly, with no further fallback chaining.
    pub async fn execute<F, Fut>(&self, operation: F) -> Result<T, ExecutionError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(limiter) = &self.limiter {
            let admitted = limiter.acquire(limiter.timeout_duration()).await;
            self.report(Stage::RateLimiter, admission_outcome(admitted), None);

            if !admitted {
                return self.complete(ExecutionError::RateLimited);
            }
        }

        if let Some(breaker) = &self.breaker {
            let admitted = breaker.allow() == Admission::Admitted;
            self.report(Stage::CircuitBreaker, admission_outcome(admitted), None);

            if !admitted {
                return self.complete(ExecutionError::CircuitOpen);
            }
        }

        let result = self
            .executor
            .execute(&self.retry, |attempt| {
                let fut = operation();
                async move {
                    let result = fut.await;
                    self.record_attempt(result.is_ok(), attempt);
                    result
                }
            })
            .await;

        match result {
            Ok(value) => Ok(value),
            Err(RetryError::NonRetryable(error)) => {
                self.complete(ExecutionError::NonRetryable(error))
            }
            Err(RetryError::Exhausted { attempts, error }) => {
                self.complete(ExecutionError::AttemptsExhausted { attempts, error })
            }
        }
    }

    /// Runs `operation` like [`execute`][Self::execute], bounded by a
    /// deadline covering the whole pipeline: admission waits, every attempt,
    /// and every backoff.
    ///
    /// Exceeding the deadline aborts execution without starting a new attempt
    /// and resolves to [`ExecutionError::DeadlineExceeded`] (through the
    /// fallback, when one is registered).
    pub async fn execute_with_deadline<F, Fut>(
        &self,
        deadline: Duration,
        operation: F,
    ) -> Result<T, ExecutionError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.execute(operation).timeout(&self.clock, deadline).await {
            Ok(result) => result,
            Err(_timed_out) => self.complete(ExecutionError::DeadlineExceeded),
        }
    }

    /// Runs `operation` like [`execute`][Self::execute] until `cancel`
    /// resolves.
    ///
    /// Cancellation aborts any in-flight suspension and resolves to
    /// [`ExecutionError::Cancelled`] (through the fallback, when one is
    /// registered). When both futures are ready in the same poll, completion
    /// wins over cancellation.
    pub async fn execute_until<F, Fut, C>(
        &self,
        cancel: C,
        operation: F,
    ) -> Result<T, ExecutionError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Future<Output = ()>,
    {
        let mut exec = pin!(self.execute(operation));
        let mut cancel = pin!(cancel);

        std::future::poll_fn(|cx| {
            if let Poll::Ready(result) = exec.as_mut().poll(cx) {
                return Poll::Ready(result);
            }

            if cancel.as_mut().poll(cx).is_ready() {
                return Poll::Ready(self.complete(ExecutionError::Cancelled));
            }

            Poll::Pending
        })
        .await
    }

    /// Records one attempt's result on the breaker and reports it to the
    /// outcome hook. Called exactly once per attempt.
    fn record_attempt(&self, success: bool, attempt: Attempt) {
        if let Some(breaker) = &self.breaker {
            breaker.record(if success {
                CallOutcome::Success
            } else {
                CallOutcome::Failure
            });
        }

        let outcome = if success {
            StageOutcome::Success
        } else {
            StageOutcome::Failure
        };
        self.report(Stage::Attempt, outcome, Some(attempt));
    }

    /// Resolves a terminal failure, routing it through the fallback when one
    /// is registered.
    fn complete(&self, error: ExecutionError<E>) -> Result<T, ExecutionError<E>> {
        match &self.fallback {
            Some(fallback) => fallback.call(error),
            None => Err(error),
        }
    }

    fn report(&self, stage: Stage, outcome: StageOutcome, attempt: Option<Attempt>) {
        if let Some(hook) = &self.on_outcome {
            hook.call(&OutcomeEvent {
                pipeline: &self.name,
                stage,
                outcome,
                attempt,
            });
        }
    }
}

fn admission_outcome(admitted: bool) -> StageOutcome {
    if admitted {
        StageOutcome::Admitted
    } else {
        StageOutcome::Rejected
    }
}

/// Builder for [`Pipeline`]. Every stage is optional; a pipeline with no
/// retry policy makes exactly one attempt.
#[derive(Debug)]
pub struct PipelineBuilder<T, E> {
    name: String,
    clock: Clock,
    limiter: Option<Arc<RateLimiter>>,
    breaker: Option<Arc<CircuitBreaker>>,
    retry: Option<RetryPolicy<E>>,
    fallback: Option<Fallback<T, E>>,
    on_outcome: Option<OnOutcome>,
}

impl<T, E> PipelineBuilder<T, E>
where
    E: 'static,
{
    /// Gates admission with the given rate limiter.
    #[must_use]
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Gates availability with the given circuit breaker.
    #[must_use]
    pub fn circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Retries attempts under the given policy.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy<E>) -> Self {
        self.retry = Some(policy);
        self
    }

    /// Registers a fallback consulted on every terminal failure.
    ///
    /// The fallback may substitute a result or return an error of its own,
    /// which propagates directly.
    #[must_use]
    pub fn fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(ExecutionError<E>) -> Result<T, ExecutionError<E>> + Send + Sync + 'static,
    {
        self.fallback = Some(Fallback::new(fallback));
        self
    }

    /// Registers a hook invoked after each admission decision and each
    /// attempt. The hook owns all observability side effects; the pipeline
    /// never formats logs or pushes metrics itself.
    #[must_use]
    pub fn on_outcome<F>(mut self, hook: F) -> Self
    where
        F: Fn(&OutcomeEvent<'_>) + Send + Sync + 'static,
    {
        self.on_outcome = Some(OnOutcome::new(hook));
        self
    }

    /// Finishes the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline<T, E> {
        Pipeline {
            name: self.name,
            limiter: self.limiter,
            breaker: self.breaker,
            retry: Arc::new(self.retry.unwrap_or_else(RetryPolicy::single_attempt)),
            fallback: self.fallback,
            on_outcome: self.on_outcome,
            executor: RetryExecutor::new(&self.clock),
            clock: self.clock,
        }
    }
}
