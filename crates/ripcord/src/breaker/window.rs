// Copyright (c) The Ripcord Project Authors.

use std::collections::VecDeque;

use super::CallOutcome;

/// A count-based window over the most recent call outcomes.
///
/// Once the window reaches capacity, recording a new outcome evicts the
/// oldest one.
#[derive(Debug)]
pub(crate) struct SlidingWindow {
    outcomes: VecDeque<CallOutcome>,
    capacity: usize,
}

impl SlidingWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn record(&mut self, outcome: CallOutcome) {
        if self.outcomes.len() == self.capacity {
            let _ = self.outcomes.pop_front();
        }

        self.outcomes.push_back(outcome);
    }

    /// Whether enough outcomes have accumulated to evaluate the failure rate.
    pub(crate) fn is_full(&self) -> bool {
        self.outcomes.len() == self.capacity
    }

    /// The percentage of recorded outcomes that are failures, in `0.0..=100.0`.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        reason = "windows are small and the rate always fits in f32"
    )]
    pub(crate) fn failure_rate(&self) -> f32 {
        if self.outcomes.is_empty() {
            return 0.0;
        }

        (f64::from(self.failures()) / self.outcomes.len() as f64 * 100.0) as f32
    }

    pub(crate) fn failures(&self) -> u32 {
        u32::try_from(
            self.outcomes
                .iter()
                .filter(|outcome| **outcome == CallOutcome::Failure)
                .count(),
        )
        .unwrap_or(u32::MAX)
    }

    pub(crate) fn successes(&self) -> u32 {
        u32::try_from(
            self.outcomes
                .iter()
                .filter(|outcome| **outcome == CallOutcome::Success)
                .count(),
        )
        .unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_window_has_zero_rate() {
        let window = SlidingWindow::new(5);

        assert!(!window.is_full());
        assert!(window.failure_rate().abs() < f32::EPSILON);
        assert_eq!(window.failures(), 0);
        assert_eq!(window.successes(), 0);
    }

    #[test]
    fn rate_reflects_contents() {
        let mut window = SlidingWindow::new(4);
        window.record(CallOutcome::Failure);
        window.record(CallOutcome::Success);
        window.record(CallOutcome::Failure);
        window.record(CallOutcome::Success);

        assert!(window.is_full());
        assert!((window.failure_rate() - 50.0).abs() < f32::EPSILON);
        assert_eq!(window.failures(), 2);
        assert_eq!(window.successes(), 2);
    }

    #[test]
    fn oldest_outcome_is_evicted_at_capacity() {
        let mut window = SlidingWindow::new(2);
        window.record(CallOutcome::Failure);
        window.record(CallOutcome::Failure);

        // Evicts one of the failures.
        window.record(CallOutcome::Success);

        assert!(window.is_full());
        assert_eq!(window.failures(), 1);
        assert_eq!(window.successes(), 1);
        assert!((window.failure_rate() - 50.0).abs() < f32::EPSILON);
    }
}
