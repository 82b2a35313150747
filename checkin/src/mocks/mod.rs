//! Mock providers for testing.
//!
//! In-memory, deterministic implementations of the provider traits.

pub mod api;
pub mod storage;

pub use api::{MockCheckinApi, RecordedRequest};
pub use storage::MemorySecureStorage;
