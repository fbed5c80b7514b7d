// Copyright (c) The Ripcord Project Authors.

use std::time::Duration;

const DEFAULT_LIMIT_FOR_PERIOD: u32 = 50;
const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(1);

/// Configuration for a [`RateLimiter`][super::RateLimiter].
///
/// Out-of-range values are clamped rather than rejected: the permit limit is
/// at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LimiterOptions {
    limit_for_period: u32,
    limit_refresh_period: Duration,
    timeout_duration: Duration,
}

impl Default for LimiterOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl LimiterOptions {
    /// Creates options with the default profile: 50 permits per 1 second
    /// window, rejecting immediately when the budget is exhausted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            limit_for_period: DEFAULT_LIMIT_FOR_PERIOD,
            limit_refresh_period: DEFAULT_REFRESH_PERIOD,
            timeout_duration: Duration::ZERO,
        }
    }

    /// Sets the number of permits issued per refresh period. Clamped to a
    /// minimum of 1.
    #[must_use]
    pub fn limit_for_period(mut self, limit: u32) -> Self {
        self.limit_for_period = limit.max(1);
        self
    }

    /// Sets the length of the permit window.
    #[must_use]
    pub fn limit_refresh_period(mut self, period: Duration) -> Self {
        self.limit_refresh_period = period;
        self
    }

    /// Sets how long a caller may wait for a permit before being rejected.
    /// Zero means reject immediately when the budget is exhausted.
    #[must_use]
    pub fn timeout_duration(mut self, timeout: Duration) -> Self {
        self.timeout_duration = timeout;
        self
    }

    pub(crate) fn limit(&self) -> u32 {
        self.limit_for_period
    }

    pub(crate) fn period(&self) -> Duration {
        self.limit_refresh_period
    }

    pub(crate) fn wait(&self) -> Duration {
        self.timeout_duration
    }
}
