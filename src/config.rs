//! Configuration constants for the benchmark suite.
//!
//! Modify these values to adjust workload shape and harness behavior.

/// Number of measured repeats per (suite, target) pair.
pub const DEFAULT_REPEAT_COUNT: usize = 10;

/// Elements created by the element-creation workload.
pub const ELEMENT_COUNT: usize = 10_000;

/// Attributes written on each created element.
pub const ATTRS_PER_ELEMENT: usize = 30;

/// Parents reparented by the restructuring workload.
pub const RESTRUCT_PARENTS: usize = 100;

/// Children appended (and first-child reads issued) per parent.
pub const RESTRUCT_CHILDREN: usize = 99;

/// Scratch regions held by the manual-buffer calling convention.
pub const SCRATCH_REGION_COUNT: usize = 3;

/// Byte length of one scratch region in guest linear memory.
///
/// String values longer than this (minus the NUL terminator) are truncated.
pub const SCRATCH_REGION_LEN: usize = 1024;

/// Default TCP port for the static file host.
pub const DEFAULT_HOST_PORT: u16 = 8080;

/// Results output directory.
pub const RESULTS_DIR: &str = "benchmark_results";

/// Media type served for `.wasm` files.
///
/// Browsers require this before they allow streaming compilation.
pub const WASM_MEDIA_TYPE: &str = "application/wasm";
