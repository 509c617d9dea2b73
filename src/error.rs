//! Error types for the store boundary, report export, and static host.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the element-store boundary.
///
/// Verification mismatches are not errors; they are accumulated by
/// [`crate::benchmark::suite::Checker`] and never abort a run.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read the module file from disk.
    #[error("failed to read module {path}")]
    ModuleRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to compile the WASM module.
    #[error("failed to compile WASM module: {reason}")]
    Compilation {
        reason: String,
        #[source]
        source: wasmtime::Error,
    },
    /// Failed to instantiate the module.
    #[error("failed to instantiate module: {reason}")]
    Instantiation {
        reason: String,
        #[source]
        source: wasmtime::Error,
    },
    /// Instance trapped during a call.
    #[error("instance trapped: {message}")]
    Trap { message: String },
    /// Exported function or memory not found.
    #[error("export not found: {name}")]
    ExportNotFound { name: String },
    /// Guest memory read or write out of bounds.
    #[error("guest memory access out of bounds at {addr:#x}")]
    MemoryAccess { addr: u32 },
    /// Guest allocator returned a null pointer.
    #[error("guest allocator failed for {len} bytes")]
    AllocFailed { len: usize },
    /// Free of a pointer the allocator does not consider live.
    #[error("free of unallocated guest pointer {addr:#x}")]
    InvalidFree { addr: u32 },
    /// Guest string was not valid UTF-8.
    #[error("invalid UTF-8 in guest string at {addr:#x}")]
    InvalidUtf8 { addr: u32 },
}

/// Errors from writing the JSON run report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report to {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from the static file host.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(String),
}
