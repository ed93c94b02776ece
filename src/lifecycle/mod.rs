//! Process-level setup shared by the binary and ad-hoc tooling.

pub mod tracing;

pub use self::tracing::setup_tracing;
