//! # Checkin Testing
//!
//! Testing utilities and helpers for the check-in companion.
//!
//! This crate provides:
//! - Deterministic clocks for the `Clock` environment trait
//! - A Given-When-Then harness for reducers
//! - Assertion helpers for effect trees
//!
//! ## Example
//!
//! ```ignore
//! use checkin_testing::{ManualClock, ReducerTest};
//!
//! let clock = ManualClock::new(test_clock().now());
//! ReducerTest::new(CheckinReducer::default())
//!     .with_env(environment_with(clock.clone()))
//!     .given_state(CheckinState::default())
//!     .when_action(ScanAction::CodeScanned { value: "ABC".into() }.into())
//!     .then_effects(|effects| assert_future_count(effects, 1))
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use checkin_core::environment::Clock;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use checkin_testing::mocks::FixedClock;
    /// use checkin_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// Clones share the same offset, so a test can keep one handle and give
    /// another to the environment.
    ///
    /// ```
    /// use checkin_testing::{ManualClock, test_clock};
    /// use checkin_core::environment::Clock;
    /// use std::time::Duration;
    ///
    /// let clock = ManualClock::new(test_clock().now());
    /// let start = clock.now();
    /// clock.advance(Duration::from_millis(1500));
    /// assert_eq!((clock.now() - start).num_milliseconds(), 1500);
    /// ```
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        start: DateTime<Utc>,
        offset_ms: Arc<AtomicI64>,
    }

    impl ManualClock {
        /// Create a clock reading `start` until advanced
        #[must_use]
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                start,
                offset_ms: Arc::new(AtomicI64::new(0)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            let millis = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
            self.offset_ms.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.start + chrono::Duration::milliseconds(self.offset_ms.load(Ordering::SeqCst))
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, ManualClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
