//! Benchmark execution and control logic.
//!
//! Each (suite, target) pair runs the fixed sequence
//! Setup -> TimedAction -> Teardown, `repeat_count` times, strictly
//! sequentially on one thread. Verification mismatches are accumulated and
//! reported; store-level failures (traps, IO) propagate and end the run.

use tracing::info;

use crate::benchmark::results::{RunReport, SuiteReport, TargetReport};
use crate::benchmark::suite::{Checker, StateFn, Suite, Target};
use crate::metrics::DurationSamples;
use crate::store::{ElementStore, StoreResult};

/// Run every suite against `store` and collect a full report.
pub fn run_all(
    suites: &mut [Suite<'_>],
    repeat_count: usize,
    store: &mut dyn ElementStore,
) -> StoreResult<RunReport> {
    let mut report = RunReport::new(repeat_count);
    for suite in suites {
        report.add_suite(run_suite(suite, repeat_count, store)?);
    }
    Ok(report)
}

/// Run one suite's targets in order.
pub fn run_suite(
    suite: &mut Suite<'_>,
    repeat_count: usize,
    store: &mut dyn ElementStore,
) -> StoreResult<SuiteReport> {
    let Suite {
        name,
        description,
        setup,
        teardown,
        targets,
    } = suite;

    let mut target_reports = Vec::with_capacity(targets.len());
    for target in targets.iter_mut() {
        target_reports.push(run_target(*name, setup, teardown, target, repeat_count, store)?);
    }

    Ok(SuiteReport {
        suite: name.to_string(),
        description: description.to_string(),
        targets: target_reports,
    })
}

fn run_target(
    suite_name: &str,
    setup: &mut StateFn<'_>,
    teardown: &mut StateFn<'_>,
    target: &mut Target<'_>,
    repeat_count: usize,
    store: &mut dyn ElementStore,
) -> StoreResult<TargetReport> {
    info!(
        "running suite {suite_name:?} with target {:?} {repeat_count}x times",
        target.name
    );

    let mut samples = DurationSamples::with_capacity(repeat_count);
    let mut checker = Checker::new();

    for _ in 0..repeat_count {
        setup(store, &mut checker)?;
        let elapsed = (target.run)(store)?;
        teardown(store, &mut checker)?;
        samples.add_sample(elapsed);
    }

    let average_ms = samples.average_ms();
    info!(
        "suite {suite_name:?} with target {:?} average cost is {average_ms:.3} milliseconds",
        target.name
    );

    Ok(TargetReport {
        target: target.name.to_string(),
        description: target.description.to_string(),
        average_ms,
        stats: samples.stats(),
        check_failures: checker.take_failures(),
    })
}
