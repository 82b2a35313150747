//! Check-in actions.
//!
//! Every input to the reducers: staff intents, scanner reads, focus changes,
//! timer expiries and the results of remote calls.

use crate::state::{Route, Session};
use checkin_api::{ApiReply, AuthSession, EventSummary, Id, RegistrationResource, SearchParameter};
use checkin_core::{DateTime, Utc};
use serde_json::Value;

/// Root action.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckinAction {
    /// Session store.
    Session(SessionAction),
    /// Sign-in form.
    Login(LoginAction),
    /// Event list and selection.
    Events(EventsAction),
    /// Scanner.
    Scan(ScanAction),
    /// Registration search.
    Search(SearchAction),
    /// Confirmation screen.
    Confirmation(ConfirmationAction),
    /// Show another screen.
    Navigate(Route),
}

/// Session store actions.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Read persisted credentials.
    Restore,
    /// Persisted credentials were read.
    Restored {
        /// Restored session, if remember-me was on and credentials were complete.
        session: Option<Session>,
    },
    /// Toggle persistence of the next session.
    SetRememberMe(bool),
    /// Establish a session (persisted iff remember-me is on).
    SetSession {
        /// Raw user object.
        user: Value,
        /// Bearer token.
        token: String,
    },
    /// End the session and purge persisted credentials.
    ClearSession,
}

/// Sign-in form actions.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginAction {
    /// Submit credentials.
    Submit {
        /// Email as typed.
        email: String,
        /// Password as typed.
        password: String,
    },
    /// Sign-in request finished.
    Completed(ApiReply<AuthSession>),
}

/// Event list actions.
#[derive(Debug, Clone, PartialEq)]
pub enum EventsAction {
    /// Fetch the events available to the signed-in user.
    Load,
    /// Event list request finished.
    Loaded(ApiReply<Vec<EventSummary>>),
    /// Make an event from the list the active event.
    Select {
        /// Id of the listed event.
        id: Id,
    },
}

/// Scanner actions.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanAction {
    /// The camera read a code.
    CodeScanned {
        /// Decoded code.
        value: String,
    },
    /// Validation request finished.
    ValidationCompleted {
        /// Event the code was validated against.
        event: Id,
        /// When the attempt started.
        started_at: DateTime<Utc>,
        /// Server reply.
        reply: ApiReply<RegistrationResource>,
    },
    /// Cooldown timer fired.
    RearmScanner {
        /// Generation the timer was scheduled under.
        generation: u64,
    },
    /// The scan screen became visible.
    FocusGained,
    /// The scan screen was hidden.
    FocusLost,
}

/// Registration search actions.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    /// Query text changed.
    QueryChanged(String),
    /// Matched field changed.
    ParameterChanged(SearchParameter),
    /// Run the search.
    Submit,
    /// Search request finished.
    Completed {
        /// Event the search was scoped to.
        event: Id,
        /// Server reply.
        reply: ApiReply<Vec<RegistrationResource>>,
    },
    /// Open a result on the confirmation screen.
    SelectResult {
        /// Index into the result list.
        index: usize,
    },
}

/// Confirmation screen actions.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationAction {
    /// Confirm the check-in.
    Confirm,
    /// Confirm request finished.
    Completed(ApiReply<()>),
    /// Leave without confirming.
    BackToScan,
}

macro_rules! impl_from_action {
    ($($variant:ident($inner:ty)),* $(,)?) => {
        $(
            impl From<$inner> for CheckinAction {
                fn from(action: $inner) -> Self {
                    Self::$variant(action)
                }
            }
        )*
    };
}

impl_from_action!(
    Session(SessionAction),
    Login(LoginAction),
    Events(EventsAction),
    Scan(ScanAction),
    Search(SearchAction),
    Confirmation(ConfirmationAction),
);
