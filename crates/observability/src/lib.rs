//! Process-wide logging setup for the ledger backend.

pub mod tracing;

pub use crate::tracing::DEFAULT_DIRECTIVE;

/// Install the JSON subscriber.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    tracing::init(DEFAULT_DIRECTIVE);
}
