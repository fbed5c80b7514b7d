// Copyright (c) The Ripcord Project Authors.

use thiserror::Error;

/// A terminal failure of a pipeline execution.
///
/// Every failed execution resolves to exactly one of these variants, so
/// callers are never left uncertain about why the operation did not produce a
/// result. The admission variants (`RateLimited`, `CircuitOpen`) mean the
/// underlying operation was never invoked; the retry variants carry the
/// operation's own error.
///
/// `E` is the error type of the protected operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionError<E> {
    /// The rate limiter denied admission, either immediately or after the
    /// configured wait elapsed without a permit becoming available.
    #[error("admission denied by rate limiter")]
    RateLimited,

    /// The circuit breaker is open and rejected the call.
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// The operation failed and the recovery classifier declared the failure
    /// terminal; no further attempts were made.
    #[error("operation failed with a non-retryable error")]
    NonRetryable(E),

    /// A retryable failure persisted through every permitted attempt.
    #[error("operation failed after {attempts} attempts")]
    AttemptsExhausted {
        /// How many times the operation was invoked.
        attempts: u32,
        /// The error returned by the final attempt.
        error: E,
    },

    /// The caller-supplied deadline elapsed before the pipeline completed.
    #[error("pipeline deadline exceeded")]
    DeadlineExceeded,

    /// The caller's cancellation signal fired during execution.
    #[error("pipeline execution cancelled")]
    Cancelled,

    /// No pipeline is registered under the requested name.
    #[error("no pipeline registered under name `{0}`")]
    UnknownPipeline(String),
}

/// The tag of an [`ExecutionError`], independent of the operation error type.
///
/// Fallbacks and outcome hooks branch on this tag without needing to inspect
/// (or own) the underlying operation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// See [`ExecutionError::RateLimited`].
    RateLimited,
    /// See [`ExecutionError::CircuitOpen`].
    CircuitOpen,
    /// See [`ExecutionError::NonRetryable`].
    NonRetryable,
    /// See [`ExecutionError::AttemptsExhausted`].
    AttemptsExhausted,
    /// See [`ExecutionError::DeadlineExceeded`].
    DeadlineExceeded,
    /// See [`ExecutionError::Cancelled`].
    Cancelled,
    /// See [`ExecutionError::UnknownPipeline`].
    UnknownPipeline,
}

impl<E> ExecutionError<E> {
    /// Returns the tag identifying this failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited => ErrorKind::RateLimited,
            Self::CircuitOpen => ErrorKind::CircuitOpen,
            Self::NonRetryable(_) => ErrorKind::NonRetryable,
            Self::AttemptsExhausted { .. } => ErrorKind::AttemptsExhausted,
            Self::DeadlineExceeded => ErrorKind::DeadlineExceeded,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::UnknownPipeline(_) => ErrorKind::UnknownPipeline,
        }
    }

    /// Returns the operation error carried by this failure, if any.
    #[must_use]
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::NonRetryable(error) | Self::AttemptsExhausted { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(ExecutionError<String>: Send, Sync, std::error::Error);
    static_assertions::assert_impl_all!(ErrorKind: Send, Sync, Copy);

    #[test]
    fn kind_matches_variant() {
        let err: ExecutionError<&str> = ExecutionError::RateLimited;
        assert_eq!(err.kind(), ErrorKind::RateLimited);

        let err: ExecutionError<&str> = ExecutionError::AttemptsExhausted {
            attempts: 3,
            error: "boom",
        };
        assert_eq!(err.kind(), ErrorKind::AttemptsExhausted);
    }

    #[test]
    fn operation_error_only_for_operation_failures() {
        let err: ExecutionError<&str> = ExecutionError::NonRetryable("bad request");
        assert_eq!(err.operation_error(), Some(&"bad request"));

        let err: ExecutionError<&str> = ExecutionError::CircuitOpen;
        assert_eq!(err.operation_error(), None);
    }

    #[test]
    fn display_includes_attempts() {
        let err: ExecutionError<&str> = ExecutionError::AttemptsExhausted {
            attempts: 4,
            error: "down",
        };
        assert_eq!(err.to_string(), "operation failed after 4 attempts");
    }
}
