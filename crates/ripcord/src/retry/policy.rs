// Copyright (c) The Ripcord Project Authors.

use std::time::Duration;

use recoverable::RecoveryInfo;

use super::backoff::DelaysIter;
use crate::rnd::Rnd;
use crate::utils::define_fn_wrapper;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MULTIPLIER: f64 = 2.0;

define_fn_wrapper!(Classifier<E>(Fn(error: &E) -> RecoveryInfo));

/// Attempt and backoff configuration for a [`RetryPolicy`].
///
/// Out-of-range values are clamped rather than rejected: at least one attempt
/// is always made and the multiplier never shrinks delays.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetryOptions {
    max_attempts: u32,
    base_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Option<Duration>,
    use_jitter: bool,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryOptions {
    /// Creates options with the default profile: 3 attempts, a 500ms base
    /// delay doubling per attempt, no cap, no jitter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            backoff_multiplier: DEFAULT_MULTIPLIER,
            max_delay: None,
            use_jitter: false,
        }
    }

    /// Sets the total number of attempts, including the first one. Clamped to
    /// a minimum of 1.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the delay before the second attempt.
    #[must_use]
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Sets the growth factor applied to successive delays. `1.0` yields a
    /// fixed interval. Clamped to a minimum of 1.0.
    #[must_use]
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    /// Caps every computed delay at the given duration.
    #[must_use]
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Enables symmetric jitter (±25%) on computed delays.
    #[must_use]
    pub fn use_jitter(mut self, enabled: bool) -> Self {
        self.use_jitter = enabled;
        self
    }
}

/// Immutable retry configuration plus a failure classifier.
///
/// A policy is built once and shared across calls; per-invocation attempt
/// state lives entirely inside [`RetryExecutor::execute`][super::RetryExecutor::execute].
///
/// `E` is the error type of the operations this policy classifies.
#[derive(Debug, Clone)]
pub struct RetryPolicy<E> {
    options: RetryOptions,
    classifier: Classifier<E>,
    rnd: Rnd,
}

impl<E> RetryPolicy<E> {
    /// Creates a policy from options and a classifier.
    ///
    /// The classifier inspects each failure and decides whether another
    /// attempt is worthwhile; it may also attach an explicit delay hint that
    /// overrides the computed backoff for that step.
    #[must_use]
    pub fn new<F>(options: RetryOptions, classifier: F) -> Self
    where
        F: Fn(&E) -> RecoveryInfo + Send + Sync + 'static,
    {
        Self {
            options,
            classifier: Classifier::new(classifier),
            rnd: Rnd::default(),
        }
    }

    /// A policy that makes exactly one attempt and treats every failure as
    /// terminal. Used by pipelines with no retry stage configured.
    pub(crate) fn single_attempt() -> Self
    where
        E: 'static,
    {
        Self::new(RetryOptions::new().max_attempts(1), |_| RecoveryInfo::never())
    }

    #[cfg(test)]
    pub(crate) fn with_rnd(mut self, rnd: Rnd) -> Self {
        self.rnd = rnd;
        self
    }

    pub(crate) fn max_attempts(&self) -> u32 {
        self.options.max_attempts
    }

    pub(crate) fn classify(&self, error: &E) -> RecoveryInfo {
        self.classifier.call(error)
    }

    pub(crate) fn delays(&self) -> DelaysIter {
        DelaysIter::new(
            self.options.base_delay,
            self.options.backoff_multiplier,
            self.options.max_delay,
            self.options.use_jitter,
            self.rnd.clone(),
        )
    }
}
