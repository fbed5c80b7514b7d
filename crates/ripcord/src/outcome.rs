// Copyright (c) The Ripcord Project Authors.

use crate::Attempt;
use crate::utils::define_fn_wrapper;

/// The pipeline stage that produced an [`OutcomeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Stage {
    /// The rate limiter admission gate.
    RateLimiter,
    /// The circuit breaker availability gate.
    CircuitBreaker,
    /// One invocation of the protected operation.
    Attempt,
}

/// What happened at a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum StageOutcome {
    /// An admission gate let the call through.
    Admitted,
    /// An admission gate rejected the call.
    Rejected,
    /// An operation attempt returned successfully.
    Success,
    /// An operation attempt returned an error.
    Failure,
}

/// A single observation reported to the outcome hook.
///
/// The engine reports one event after each admission decision and after each
/// operation attempt. It never formats logs or pushes metrics itself; the
/// registered hook owns all observability side effects.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeEvent<'a> {
    /// Name of the pipeline that produced the event.
    pub pipeline: &'a str,
    /// The stage that produced the event.
    pub stage: Stage,
    /// The decision or result observed at that stage.
    pub outcome: StageOutcome,
    /// The attempt this event belongs to; `None` for admission decisions.
    pub attempt: Option<Attempt>,
}

define_fn_wrapper!(OnOutcome(Fn(event: &OutcomeEvent<'_>) -> ()));
