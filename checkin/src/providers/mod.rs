//! Check-in providers.
//!
//! Traits for every external dependency of the reducers, plus the
//! production implementations. Reducers only see the traits; the
//! environment carries the implementations.
//!
//! - [`CheckinApi`]: the event-management HTTP API
//! - [`SecureStorage`]: key/value storage for remembered credentials

pub mod api;
pub mod storage;

pub use api::CheckinApi;
pub use storage::{
    FileSecureStorage, SecureStorage, StorageQueue, persist_session, purge_session,
    restore_session,
};
