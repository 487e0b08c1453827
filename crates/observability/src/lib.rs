//! Logging setup shared by binaries and tests.

/// Initialize process-wide logging.
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::from_env());
}

/// Route logs to the test harness's captured output.
pub fn init_for_tests() {
    tracing::init_for_tests();
}

/// Subscriber configuration (filters, output format).
pub mod tracing;
