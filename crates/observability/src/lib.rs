//! Tracing and logging setup shared by the service binaries and tests.

/// Initialize process-wide logging with the default `info` filter.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init("info");
}

/// Tracing configuration (filters, formatting).
pub mod tracing;
