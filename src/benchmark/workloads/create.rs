//! Element-creation workload: 10k elements, 30 attributes each.
//!
//! Per repeat this is one `add_element` plus thirty `set_attr` calls per
//! element, roughly 300k boundary crossings for the per-call conventions.

use std::time::Instant;

use crate::benchmark::suite::{Suite, Target};
use crate::benchmark::workloads::Strategy;
use crate::config::{ATTRS_PER_ELEMENT, ELEMENT_COUNT, SCRATCH_REGION_COUNT, SCRATCH_REGION_LEN};
use crate::store::{ElementStore, ScratchRegions};

pub fn suite() -> Suite<'static> {
    Suite {
        name: "create elements",
        description: "builds 10k elements with 30 attributes each",
        setup: Box::new(|store, checker| {
            store.clear()?;
            checker.check_eq(0u32, store.element_count()?, "element count after clear");
            Ok(())
        }),
        teardown: Box::new(|store, checker| {
            checker.check_eq(
                ELEMENT_COUNT as u32,
                store.element_count()?,
                "element count after create",
            );
            checker.check_eq("value-20", store.attr("node-100", "attr-20")?, "attr-20 of node-100");
            checker.check_eq("value-7", store.attr("node-999", "attr-7")?, "attr-7 of node-999");
            checker.check_eq("", store.attr("node-999", "attr-1000")?, "out-of-range attribute");
            checker.check_eq("", store.attr("node-A", "attr-1")?, "attribute of unknown element");
            Ok(())
        }),
        targets: vec![
            Target {
                name: Strategy::Marshalled.name(),
                description: Strategy::Marshalled.description(),
                run: Box::new(|store| {
                    let started = Instant::now();
                    for i in 0..ELEMENT_COUNT {
                        let id = format!("node-{i}");
                        store.add_element(&id)?;
                        for j in 0..ATTRS_PER_ELEMENT {
                            store.set_attr(&id, &format!("attr-{j}"), &format!("value-{j}"))?;
                        }
                    }
                    Ok(started.elapsed())
                }),
            },
            Target {
                name: Strategy::Scratch.name(),
                description: Strategy::Scratch.description(),
                run: Box::new(|store| {
                    // Acquisition and release stay outside the measurement.
                    let mut regions = ScratchRegions::acquire(
                        store.raw(),
                        SCRATCH_REGION_COUNT,
                        SCRATCH_REGION_LEN,
                    )?;
                    let started = Instant::now();
                    for i in 0..ELEMENT_COUNT {
                        let id = format!("node-{i}");
                        regions.add_element(&id)?;
                        for j in 0..ATTRS_PER_ELEMENT {
                            regions.set_attr(&id, &format!("attr-{j}"), &format!("value-{j}"))?;
                        }
                    }
                    Ok(started.elapsed())
                }),
            },
            Target {
                name: Strategy::Batched.name(),
                description: Strategy::Batched.description(),
                run: Box::new(|store| {
                    let started = Instant::now();
                    store.create_elements()?;
                    Ok(started.elapsed())
                }),
            },
        ],
    }
}
