// Copyright (c) The Ripcord Project Authors.

use std::fmt::Display;

/// Represents a single attempt of a protected operation.
///
/// Attempt numbers are 1-based: the first invocation of an operation is
/// attempt `1`, and the last permitted invocation is attempt `max_attempts`.
///
/// # Examples
///
/// ```
/// use ripcord::Attempt;
///
/// let attempt = Attempt::first(3);
/// assert_eq!(attempt.number(), 1);
/// assert!(attempt.is_first());
/// assert!(!attempt.is_last());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    number: u32,
    is_last: bool,
}

impl Attempt {
    /// Creates the first attempt for an operation allowed `max_attempts` total attempts.
    #[must_use]
    pub fn first(max_attempts: u32) -> Self {
        Self {
            number: 1,
            is_last: max_attempts <= 1,
        }
    }

    /// Returns true if this is the first attempt.
    #[must_use]
    pub fn is_first(self) -> bool {
        self.number == 1
    }

    /// Returns true if this is the last permitted attempt.
    #[must_use]
    pub fn is_last(self) -> bool {
        self.is_last
    }

    /// Returns the 1-based attempt number.
    #[must_use]
    pub fn number(self) -> u32 {
        self.number
    }

    /// Advances to the next attempt, or `None` when the budget is spent.
    pub(crate) fn increment(self, max_attempts: u32) -> Option<Self> {
        let next = self.number.saturating_add(1);
        if next > max_attempts {
            return None;
        }

        Some(Self {
            number: next,
            is_last: next == max_attempts,
        })
    }
}

impl Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.number.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_of_one_is_first_and_last() {
        let a = Attempt::first(1);
        assert_eq!(a.number(), 1);
        assert!(a.is_first());
        assert!(a.is_last());
    }

    #[test]
    fn increment_walks_to_budget_end() {
        let a = Attempt::first(3);
        assert!(!a.is_last());

        let a = a.increment(3).unwrap();
        assert_eq!(a.number(), 2);
        assert!(!a.is_last());

        let a = a.increment(3).unwrap();
        assert_eq!(a.number(), 3);
        assert!(a.is_last());

        assert!(a.increment(3).is_none());
    }

    #[test]
    fn display_shows_number() {
        let a = Attempt::first(5);
        assert_eq!(format!("{a}"), "1");
    }
}
