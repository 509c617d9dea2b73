//! Tree-restructuring workload over an already-populated store.
//!
//! For each of the first 100 elements: append the next 99 elements as
//! children, then issue 99 first-child reads. About 20k boundary crossings
//! for the per-call conventions.

use std::time::Instant;

use crate::benchmark::suite::{Suite, Target};
use crate::benchmark::workloads::Strategy;
use crate::config::{ELEMENT_COUNT, RESTRUCT_CHILDREN, RESTRUCT_PARENTS, SCRATCH_REGION_LEN};
use crate::store::{ElementStore, ScratchRegions};

pub fn suite() -> Suite<'static> {
    Suite {
        name: "restructure elements",
        description: "reparents children across the first 100 elements and reads them back",
        setup: Box::new(|store, checker| {
            // Populates node-0..node-9999; idempotent over a full store.
            store.create_elements()?;
            checker.check_eq(
                ELEMENT_COUNT as u32,
                store.element_count()?,
                "element count before restructuring",
            );
            Ok(())
        }),
        teardown: Box::new(|store, checker| {
            checker.check_eq("node-1", store.first_child("node-0")?, "first child of node-0");
            Ok(())
        }),
        targets: vec![
            Target {
                name: Strategy::Marshalled.name(),
                description: Strategy::Marshalled.description(),
                run: Box::new(|store| {
                    let started = Instant::now();
                    for i in 0..RESTRUCT_PARENTS {
                        let parent_id = format!("node-{i}");
                        for j in 0..RESTRUCT_CHILDREN {
                            store.append_child(&parent_id, &format!("node-{}", i + j + 1))?;
                        }
                        for _ in 0..RESTRUCT_CHILDREN {
                            let _ = store.first_child(&parent_id)?;
                        }
                    }
                    Ok(started.elapsed())
                }),
            },
            Target {
                name: Strategy::Scratch.name(),
                description: Strategy::Scratch.description(),
                run: Box::new(|store| {
                    // Two regions: parent id and child id.
                    let mut regions =
                        ScratchRegions::acquire(store.raw(), 2, SCRATCH_REGION_LEN)?;
                    let started = Instant::now();
                    for i in 0..RESTRUCT_PARENTS {
                        let parent_id = format!("node-{i}");
                        for j in 0..RESTRUCT_CHILDREN {
                            regions.append_child(&parent_id, &format!("node-{}", i + j + 1))?;
                        }
                        for _ in 0..RESTRUCT_CHILDREN {
                            let _ = regions.first_child(&parent_id)?;
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
                    store.restruct_tree()?;
                    Ok(started.elapsed())
                }),
            },
        ],
    }
}
