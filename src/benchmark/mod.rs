//! Core benchmarking logic and workload definitions.

pub mod results;
pub mod runner;
pub mod suite;
pub mod workloads;

pub use results::{RunReport, SuiteReport, TargetReport};
pub use runner::{run_all, run_suite};
pub use suite::{CheckFailure, Checker, Suite, Target};
pub use workloads::{standard_suites, Strategy};
