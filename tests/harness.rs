//! End-to-end harness runs against the in-process fake store.

use wasm_bridge_bench::benchmark::workloads::standard_suites;
use wasm_bridge_bench::benchmark::{run_all, run_suite};
use wasm_bridge_bench::config::{ATTRS_PER_ELEMENT, ELEMENT_COUNT};
use wasm_bridge_bench::store::{ElementStore, FakeStore};

#[test]
fn full_run_is_clean_and_complete() {
    let mut store = FakeStore::new();
    let mut suites = standard_suites();

    let report = run_all(&mut suites, 2, &mut store).unwrap();

    assert_eq!(report.suites.len(), 2);
    for suite in &report.suites {
        assert_eq!(suite.targets.len(), 3);
        for target in &suite.targets {
            assert_eq!(target.stats.count, 2);
            assert!(target.average_ms >= 0.0);
            assert!(
                target.check_failures.is_empty(),
                "unexpected mismatches in {}/{}: {:?}",
                suite.suite,
                target.target,
                target.check_failures
            );
        }
    }
    // no scratch region leaked across the scratch targets
    assert_eq!(store.outstanding_allocations(), 0);
}

#[test]
fn create_suite_marshalled_builds_the_full_grid() {
    let mut store = FakeStore::new();
    let mut suites = standard_suites();
    let create = suites
        .iter_mut()
        .find(|s| s.name == "create elements")
        .unwrap();
    create.targets.retain(|t| t.name == "marshalled");

    let report = run_suite(create, 1, &mut store).unwrap();

    assert!(report.targets[0].check_failures.is_empty());
    assert_eq!(store.element_count().unwrap(), ELEMENT_COUNT as u32);
    for j in 0..ATTRS_PER_ELEMENT {
        assert_eq!(
            store.attr("node-100", &format!("attr-{j}")).unwrap(),
            format!("value-{j}")
        );
    }
    assert_eq!(store.attr("node-100", "attr-20").unwrap(), "value-20");
    // out-of-range attribute reads stay empty, never errors
    assert_eq!(store.attr("node-999", "attr-1000").unwrap(), "");
}

#[test]
fn create_suite_scratch_matches_the_marshalled_result() {
    let mut store = FakeStore::new();
    let mut suites = standard_suites();
    let create = suites
        .iter_mut()
        .find(|s| s.name == "create elements")
        .unwrap();
    create.targets.retain(|t| t.name == "scratch");

    let report = run_suite(create, 1, &mut store).unwrap();

    assert!(report.targets[0].check_failures.is_empty());
    assert_eq!(store.element_count().unwrap(), ELEMENT_COUNT as u32);
    assert_eq!(store.attr("node-9999", "attr-29").unwrap(), "value-29");
    assert_eq!(store.outstanding_allocations(), 0);
}

#[test]
fn restruct_suite_batched_links_the_first_parent() {
    let mut store = FakeStore::new();
    let mut suites = standard_suites();
    let restruct = suites
        .iter_mut()
        .find(|s| s.name == "restructure elements")
        .unwrap();
    restruct.targets.retain(|t| t.name == "batched");

    let report = run_suite(restruct, 1, &mut store).unwrap();

    assert!(report.targets[0].check_failures.is_empty());
    assert_eq!(store.element_count().unwrap(), ELEMENT_COUNT as u32);
    assert_eq!(store.first_child("node-0").unwrap(), "node-1");
}

#[test]
fn repeated_runs_reuse_the_same_store() {
    // the restructure suite's setup must hold over an already-populated
    // store, exactly as the batch entry point behaves
    let mut store = FakeStore::new();
    let mut suites = standard_suites();
    let restruct = suites
        .iter_mut()
        .find(|s| s.name == "restructure elements")
        .unwrap();

    let report = run_suite(restruct, 3, &mut store).unwrap();

    for target in &report.targets {
        assert!(target.check_failures.is_empty(), "{:?}", target.check_failures);
    }
}
