//! Suite and target descriptors, plus soft verification.
//!
//! A suite bundles a setup action, a teardown/verification action, and an
//! ordered list of timed targets. Descriptors are constructed once at
//! startup, iterated once by the runner, and discarded.

use std::fmt::Display;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::{ElementStore, StoreResult};

/// Setup/teardown action: prepares or verifies external store state.
pub type StateFn<'a> = Box<dyn FnMut(&mut dyn ElementStore, &mut Checker) -> StoreResult<()> + 'a>;

/// Timed action: returns the elapsed time of the operation under test.
///
/// Target-local preparation (scratch acquisition, release) stays outside
/// the returned measurement.
pub type TimedFn<'a> = Box<dyn FnMut(&mut dyn ElementStore) -> StoreResult<Duration> + 'a>;

/// A named measurement target: one calling convention over one workload.
pub struct Target<'a> {
    pub name: &'static str,
    pub description: &'static str,
    pub run: TimedFn<'a>,
}

/// A named test suite: setup, teardown/verification, and its targets.
pub struct Suite<'a> {
    pub name: &'static str,
    pub description: &'static str,
    pub setup: StateFn<'a>,
    pub teardown: StateFn<'a>,
    pub targets: Vec<Target<'a>>,
}

/// One recorded verification mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFailure {
    /// What was being verified.
    pub what: String,
    pub expected: String,
    pub actual: String,
}

/// Soft verification: mismatches are recorded and logged, never raised,
/// so one broken target cannot abort the whole run.
#[derive(Debug, Default)]
pub struct Checker {
    failures: Vec<CheckFailure>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mismatch if `expected != actual`.
    pub fn check_eq<T, U>(&mut self, expected: T, actual: U, what: &str)
    where
        T: PartialEq<U> + Display,
        U: Display,
    {
        if expected != actual {
            warn!("{what}: verification mismatch, expected={expected}, actual={actual}");
            self.failures.push(CheckFailure {
                what: what.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[CheckFailure] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<CheckFailure> {
        std::mem::take(&mut self.failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_values_leave_checker_clean() {
        let mut checker = Checker::new();
        checker.check_eq(10, 10, "count");
        checker.check_eq("a", "a", "id");
        assert!(checker.is_clean());
    }

    #[test]
    fn mismatch_is_recorded_not_raised() {
        let mut checker = Checker::new();
        checker.check_eq("value-20", "value-19", "attr of node-100");
        checker.check_eq(0, 7, "element count");
        assert!(!checker.is_clean());
        assert_eq!(
            checker.failures(),
            &[
                CheckFailure {
                    what: "attr of node-100".into(),
                    expected: "value-20".into(),
                    actual: "value-19".into(),
                },
                CheckFailure {
                    what: "element count".into(),
                    expected: "0".into(),
                    actual: "7".into(),
                },
            ]
        );
    }

    #[test]
    fn take_failures_drains() {
        let mut checker = Checker::new();
        checker.check_eq(1, 2, "x");
        assert_eq!(checker.take_failures().len(), 1);
        assert!(checker.is_clean());
    }
}
