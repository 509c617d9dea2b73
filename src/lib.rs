//! # wasm-bridge-bench
//!
//! A micro-benchmark suite comparing three calling conventions for
//! invoking compiled WebAssembly functions from a native host: generic
//! per-call string marshalling, manually managed scratch buffers with raw
//! numeric calls, and module-side batching with a single boundary
//! crossing. A companion static file host serves the benchmark assets for
//! browser-driven runs.
//!
//! ## Modules
//!
//! - [`benchmark`]: suite/target descriptors, runner, results, workloads
//! - [`store`]: the element-store boundary (wasmtime-backed and fake)
//! - [`metrics`]: duration sample collection and statistics
//! - [`host`]: static file host
//! - [`config`]: workload and harness constants
//! - [`error`]: error types

pub mod benchmark;
pub mod config;
pub mod error;
pub mod host;
pub mod metrics;
pub mod store;

pub use benchmark::runner::run_all;
pub use benchmark::workloads::standard_suites;
pub use benchmark::RunReport;
pub use store::{ElementStore, FakeStore, WasmStore};
