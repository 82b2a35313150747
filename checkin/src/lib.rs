//! # Check-in Companion
//!
//! Staff-side state machines for event check-in: sign in, pick an event,
//! scan or search a registration, confirm the check-in.
//!
//! ## Architecture
//!
//! Every screen is driven by one reducer over one [`CheckinState`]:
//!
//! ```text
//! Action → Reducer → (State, Effects) → Effect Execution → More Actions
//! ```
//!
//! Remote calls go through [`CheckinApi`] and remembered credentials through
//! [`SecureStorage`]; both live in the [`CheckinEnvironment`] so tests swap
//! them for the mocks in [`mocks`].
//!
//! ## Example: scanning a code
//!
//! ```rust,ignore
//! use checkin_app::*;
//! use checkin_runtime::Store;
//!
//! let store = Store::new(CheckinState::default(), CheckinReducer::default(), env);
//!
//! store.send(SessionAction::Restore.into()).await?;
//! store.send(ScanAction::CodeScanned { value: "REG-1".into() }.into()).await?;
//!
//! // Validation succeeded: the registration is ready for confirmation
//! let route = store.state(|s| s.route).await;
//! assert_eq!(route, Route::Confirmation);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod actions;
pub mod config;
pub mod environment;
pub mod error;
pub mod providers;
pub mod reducers;
pub mod shell;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use actions::{
    CheckinAction, ConfirmationAction, EventsAction, LoginAction, ScanAction, SearchAction,
    SessionAction,
};
pub use config::{CheckinConfig, ScanConfig};
pub use environment::CheckinEnvironment;
pub use error::{CheckinError, ConfigError, Operation, StorageError};
pub use providers::{CheckinApi, FileSecureStorage, SecureStorage};
pub use reducers::{CheckinReducer, SCAN_REARM};
pub use state::{CheckinState, ConfirmationView, Route, ScanPhase, Session};
