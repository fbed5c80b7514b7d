// Copyright (c) The Ripcord Project Authors.

use std::time::Duration;

const DEFAULT_SLIDING_WINDOW_SIZE: usize = 10;
const DEFAULT_FAILURE_RATE_THRESHOLD: f32 = 50.0;
const DEFAULT_WAIT_DURATION: Duration = Duration::from_secs(30);
const DEFAULT_PERMITTED_CALLS: u32 = 3;

/// Configuration for a [`CircuitBreaker`][super::CircuitBreaker].
///
/// Out-of-range values are clamped rather than rejected: the window size and
/// permitted trial-call count are at least 1, and the failure-rate threshold
/// is kept within `0.0..=100.0`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BreakerOptions {
    sliding_window_size: usize,
    failure_rate_threshold: f32,
    wait_duration_in_open_state: Duration,
    permitted_calls_in_half_open: u32,
}

impl Default for BreakerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerOptions {
    /// Creates options with the default profile: a window of 10 calls, a 50%
    /// failure-rate threshold, a 30 second open duration, and 3 trial calls.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sliding_window_size: DEFAULT_SLIDING_WINDOW_SIZE,
            failure_rate_threshold: DEFAULT_FAILURE_RATE_THRESHOLD,
            wait_duration_in_open_state: DEFAULT_WAIT_DURATION,
            permitted_calls_in_half_open: DEFAULT_PERMITTED_CALLS,
        }
    }

    /// Sets the number of recent call outcomes considered when computing the
    /// failure rate. Clamped to a minimum of 1.
    #[must_use]
    pub fn sliding_window_size(mut self, size: usize) -> Self {
        self.sliding_window_size = size.max(1);
        self
    }

    /// Sets the failure-rate percentage (0–100) at which the breaker opens.
    /// The rate is only evaluated once the sliding window is full.
    #[must_use]
    pub fn failure_rate_threshold(mut self, percent: f32) -> Self {
        self.failure_rate_threshold = percent.clamp(0.0, 100.0);
        self
    }

    /// Sets how long the breaker stays open before probing with trial calls.
    #[must_use]
    pub fn wait_duration_in_open_state(mut self, duration: Duration) -> Self {
        self.wait_duration_in_open_state = duration;
        self
    }

    /// Sets how many trial calls are admitted while half-open. Clamped to a
    /// minimum of 1.
    #[must_use]
    pub fn permitted_calls_in_half_open(mut self, calls: u32) -> Self {
        self.permitted_calls_in_half_open = calls.max(1);
        self
    }

    pub(crate) fn window_size(&self) -> usize {
        self.sliding_window_size
    }

    pub(crate) fn threshold(&self) -> f32 {
        self.failure_rate_threshold
    }

    pub(crate) fn wait_duration(&self) -> Duration {
        self.wait_duration_in_open_state
    }

    pub(crate) fn permitted_calls(&self) -> u32 {
        self.permitted_calls_in_half_open
    }
}
