//! Check-in environment.
//!
//! Dependencies injected into the reducers.

use crate::providers::{CheckinApi, SecureStorage, StorageQueue};
use checkin_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// Check-in environment.
///
/// # Type Parameters
///
/// - `A`: Event-management API
/// - `S`: Credential storage
#[derive(Clone)]
pub struct CheckinEnvironment<A, S>
where
    A: CheckinApi + Clone,
    S: SecureStorage + Clone,
{
    /// Event-management API.
    pub api: A,

    /// Credential storage.
    pub storage: S,

    /// Ordering of writes to `storage`.
    pub storage_queue: StorageQueue,

    /// Time source for scan de-duplication and cooldowns.
    pub clock: Arc<dyn Clock>,
}

impl<A, S> CheckinEnvironment<A, S>
where
    A: CheckinApi + Clone,
    S: SecureStorage + Clone,
{
    /// Create an environment on the system clock.
    #[must_use]
    pub fn new(api: A, storage: S) -> Self {
        Self {
            api,
            storage,
            storage_queue: StorageQueue::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
