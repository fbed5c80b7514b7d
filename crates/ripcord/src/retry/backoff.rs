// Copyright (c) The Ripcord Project Authors.

use std::cmp::min;
use std::time::Duration;

use crate::rnd::Rnd;

/// The factor used to determine the range of jitter applied to delays.
const JITTER_FACTOR: f64 = 0.5;

/// An infinite iterator over inter-attempt delays.
///
/// The n-th delay (0-based) is `base_delay * multiplier^n`, optionally
/// jittered, then clamped to `max_delay`.
#[derive(Debug)]
pub(crate) struct DelaysIter {
    base_delay: Duration,
    multiplier: f64,
    max_delay: Option<Duration>,
    use_jitter: bool,
    rnd: Rnd,
    attempt: u32,
}

impl DelaysIter {
    pub(crate) fn new(
        base_delay: Duration,
        multiplier: f64,
        max_delay: Option<Duration>,
        use_jitter: bool,
        rnd: Rnd,
    ) -> Self {
        Self {
            base_delay,
            multiplier,
            max_delay,
            use_jitter,
            rnd,
            attempt: 0,
        }
    }
}

impl Iterator for DelaysIter {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        // zero base delay => always zero
        if self.base_delay.is_zero() {
            return Some(Duration::ZERO);
        }

        let factor = self.multiplier.powi(i32::try_from(self.attempt).unwrap_or(i32::MAX));
        let mut delay = secs_to_duration_saturating(self.base_delay.as_secs_f64() * factor);

        if self.use_jitter {
            delay = apply_jitter(delay, &self.rnd);
        }

        self.attempt = self.attempt.saturating_add(1);
        Some(clamp_to_max(delay, self.max_delay))
    }
}

fn clamp_to_max(d: Duration, max: Option<Duration>) -> Duration {
    max.map_or(d, |m| min(d, m))
}

/// Adds a symmetric, uniform jitter around the given delay.
///
/// - Jitter is in both directions and relative to `delay` (centered on it).
/// - With `JITTER_FACTOR = 0.5`, the result lies in `[0.75*delay, 1.25*delay]`.
/// - Randomness comes from [`Rnd`]; conversion saturates on overflow and clamps at zero.
#[inline]
fn apply_jitter(delay: Duration, rnd: &Rnd) -> Duration {
    let ms = delay.as_secs_f64() * 1000.0;
    let offset = (ms * JITTER_FACTOR) / 2.0;
    let random_delay = (ms * JITTER_FACTOR).mul_add(rnd.next_f64(), -offset);
    let new_ms = ms + random_delay;

    secs_to_duration_saturating(new_ms / 1000.0)
}

fn secs_to_duration_saturating(secs: f64) -> Duration {
    if secs <= 0.0 {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
