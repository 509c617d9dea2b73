//! Benchmark workload definitions.
//!
//! Each suite exercises the same store operations through the three
//! calling conventions, so the measured difference is boundary-crossing
//! and marshalling cost rather than workload shape.

mod create;
mod restruct;

use crate::benchmark::suite::Suite;

/// The three calling conventions measured against each workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Generic per-call wrapper: every call converts strings in both
    /// directions and allocates guest buffers for its arguments.
    Marshalled,
    /// Fixed scratch regions acquired once and reused for every call;
    /// per-call cost is encoding plus the raw numeric call.
    Scratch,
    /// The whole inner workload delegated to one module-side entry point,
    /// crossing the boundary exactly once.
    Batched,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Marshalled => "marshalled",
            Self::Scratch => "scratch",
            Self::Batched => "batched",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Marshalled => "per-call string marshalling through freshly allocated buffers",
            Self::Scratch => "raw numeric calls through reused fixed scratch buffers",
            Self::Batched => "single boundary crossing into a module-side batch routine",
        }
    }

    pub fn all() -> &'static [Strategy] {
        &[Self::Marshalled, Self::Scratch, Self::Batched]
    }
}

/// The standard suites, in execution order.
pub fn standard_suites() -> Vec<Suite<'static>> {
    vec![create::suite(), restruct::suite()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_suite_has_a_target_per_strategy() {
        for suite in standard_suites() {
            assert!(!suite.targets.is_empty());
            assert_eq!(suite.targets.len(), Strategy::all().len());
            for (target, strategy) in suite.targets.iter().zip(Strategy::all()) {
                assert_eq!(target.name, strategy.name());
            }
        }
    }

    #[test]
    fn suite_names_are_unique() {
        let suites = standard_suites();
        let mut names: Vec<_> = suites.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), suites.len());
    }
}
