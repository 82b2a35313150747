//! Check-in state types.
//!
//! All state lives in one [`CheckinState`] owned by the store. Each part is
//! owned by exactly one reducer; the rest only read it.

use crate::error::CheckinError;
use checkin_api::{EventSummary, Id, RegistrationResource, SearchParameter};
use checkin_core::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ═══════════════════════════════════════════════════════════════════════
// Routing
// ═══════════════════════════════════════════════════════════════════════

/// Screen currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Route {
    /// Credentials are being restored.
    #[default]
    Splash,
    /// Sign-in form.
    Login,
    /// Event picker.
    EventSelection,
    /// Camera scanner.
    Scan,
    /// Manual registration search.
    Search,
    /// Registration review and check-in.
    Confirmation,
}

// ═══════════════════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════════════════

/// Authenticated staff session.
///
/// Token and user only exist together.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token.
    pub token: String,
    /// Raw user object returned at login.
    pub user: Value,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Session store.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Current session, if signed in.
    pub current: Option<Session>,
    /// Whether a new session is persisted.
    pub remember_me: bool,
    /// Whether persisted credentials are still being read.
    pub restoring: bool,
}

impl SessionState {
    /// Bearer token of the current session.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|session| session.token.as_str())
    }

    /// Raw user of the current session.
    #[must_use]
    pub fn user(&self) -> Option<&Value> {
        self.current.as_ref().map(|session| &session.user)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current: None,
            remember_me: false,
            restoring: true,
        }
    }
}

/// Change of the session observed by dependent stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    /// A session was established or restored.
    Established,
    /// The session ended (logout or 403).
    Cleared,
}

// ═══════════════════════════════════════════════════════════════════════
// App state
// ═══════════════════════════════════════════════════════════════════════

/// Event all check-in operations are scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEvent {
    /// Event id.
    pub id: Id,
    /// Event name.
    pub name: String,
}

impl From<EventSummary> for AppEvent {
    fn from(event: EventSummary) -> Self {
        Self {
            id: event.id,
            name: event.name,
        }
    }
}

/// Staff profile derived from the login user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppProfile {
    /// Display name.
    pub name: String,
    /// Contact email, possibly empty.
    pub email: String,
}

impl AppProfile {
    /// Name used when the user has an email but no name.
    pub const FALLBACK_NAME: &'static str = "Team Member";

    /// Derive a profile from a raw user object.
    ///
    /// The name is `name`, else first and last name joined, else
    /// "Team Member". A user with neither name nor email has no profile.
    #[must_use]
    pub fn from_user(user: &Value) -> Option<Self> {
        let text = |key: &str| {
            user.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };

        let name = text("name").map(str::to_string).unwrap_or_else(|| {
            [text("firstname"), text("lastname")]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ")
        });
        let email = text("email").unwrap_or_default().to_string();

        if name.is_empty() && email.is_empty() {
            return None;
        }

        Some(Self {
            name: if name.is_empty() {
                Self::FALLBACK_NAME.to_string()
            } else {
                name
            },
            email,
        })
    }
}

/// Opaque usage counters echoed by the server.
pub type AppStats = serde_json::Map<String, Value>;

/// App state store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Selected event.
    pub event: Option<AppEvent>,
    /// Signed-in staff profile.
    pub profile: Option<AppProfile>,
    /// Last stats seen in any response.
    pub stats: Option<AppStats>,
    /// Events available for selection.
    pub events: Vec<EventSummary>,
    /// Whether the event list is loading.
    pub events_loading: bool,
    /// Error of the last event list load.
    pub events_error: Option<CheckinError>,
}

impl AppState {
    /// Select (or clear) the active event.
    ///
    /// Returns whether the event id changed.
    pub fn set_event(&mut self, event: Option<AppEvent>) -> bool {
        let changed = self.event.as_ref().map(|e| &e.id) != event.as_ref().map(|e| &e.id);
        self.event = event;
        changed
    }

    /// Derive the profile from a raw user object.
    pub fn set_profile_from_user(&mut self, user: Option<&Value>) {
        self.profile = user.and_then(AppProfile::from_user);
    }

    /// Record stats carried by a response body.
    ///
    /// Bodies without a `stats` key leave the stats untouched; a `stats`
    /// value that is not an object clears them.
    pub fn apply_stats_from_response(&mut self, payload: Option<&Value>) {
        let Some(body) = payload.and_then(Value::as_object) else {
            return;
        };
        if let Some(stats) = body.get("stats") {
            self.stats = stats.as_object().cloned();
        }
    }

    /// Reset everything owned by the app state.
    pub fn clear(&mut self) {
        self.event = None;
        self.profile = None;
        self.stats = None;
        self.events.clear();
        self.events_loading = false;
        self.events_error = None;
    }

    /// Id of the selected event.
    #[must_use]
    pub fn event_id(&self) -> Option<&Id> {
        self.event.as_ref().map(|event| &event.id)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registration
// ═══════════════════════════════════════════════════════════════════════

/// Registration store: at most one selected registration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationState {
    /// Registration under review.
    pub current: Option<RegistrationResource>,
}

impl RegistrationState {
    /// Replace (or clear) the held registration.
    pub fn set(&mut self, registration: Option<RegistrationResource>) {
        self.current = registration;
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Screens
// ═══════════════════════════════════════════════════════════════════════

/// Sign-in form state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginState {
    /// Whether a sign-in request is in flight.
    pub loading: bool,
    /// Error shown under the form.
    pub error: Option<CheckinError>,
    /// Confirmation shown after a successful sign-in.
    pub notice: Option<String>,
}

/// Phase of the scanner state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanPhase {
    /// Accepting codes.
    Idle,
    /// Validating a code.
    Processing,
    /// Waiting to re-arm after a failure.
    Cooldown,
    /// Scanner off (screen not focused).
    #[default]
    Inactive,
}

/// Last accepted read, used to drop duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanAttempt {
    /// Code that was read.
    pub value: String,
    /// When it was read.
    pub at: DateTime<Utc>,
}

/// Scanner state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanState {
    /// Machine phase.
    pub phase: ScanPhase,
    /// Whether the scan screen is focused.
    pub focused: bool,
    /// Whether a validation request is in flight.
    pub in_flight: bool,
    /// Last accepted read.
    pub last_scan: Option<ScanAttempt>,
    /// Start of the current or last validation.
    pub attempt_started_at: Option<DateTime<Utc>>,
    /// Error shown over the camera.
    pub error: Option<CheckinError>,
    /// Identifies the pending re-arm; bumped whenever one is scheduled or
    /// discarded so stale timers are ignored.
    pub rearm_generation: u64,
}

impl ScanState {
    /// Whether the camera should deliver codes.
    #[must_use]
    pub fn accepts_codes(&self) -> bool {
        self.phase == ScanPhase::Idle && !self.in_flight
    }
}

/// Registration search state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// Text typed by the user.
    pub query: String,
    /// Field the query matches.
    pub parameter: SearchParameter,
    /// Results of the last search.
    pub results: Vec<RegistrationResource>,
    /// Whether a search is in flight.
    pub loading: bool,
    /// Whether a search completed since the last reset.
    pub searched: bool,
    /// Error of the last search.
    pub error: Option<CheckinError>,
}

impl SearchState {
    /// Drop results and errors (event changed or session ended).
    pub fn reset_results(&mut self) {
        self.results.clear();
        self.searched = false;
        self.error = None;
    }
}

/// Confirmation screen state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfirmationState {
    /// Whether a confirm request is in flight.
    pub loading: bool,
    /// Retryable error of the last confirm.
    pub error: Option<CheckinError>,
}

/// What the confirmation screen shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfirmationView<'a> {
    /// Nothing to confirm: only the way back to scanning is offered.
    Invalid,
    /// A registration that may be checked in.
    Ready {
        /// Registration under review.
        registration: &'a RegistrationResource,
        /// Whether a confirm request is in flight.
        loading: bool,
        /// Retryable error of the last attempt.
        error: Option<&'a CheckinError>,
    },
}

// ═══════════════════════════════════════════════════════════════════════
// Root
// ═══════════════════════════════════════════════════════════════════════

/// Root state of the application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckinState {
    /// Session store.
    pub session: SessionState,
    /// App state store.
    pub app: AppState,
    /// Registration store.
    pub registration: RegistrationState,
    /// Sign-in form.
    pub login: LoginState,
    /// Scanner.
    pub scan: ScanState,
    /// Search screen.
    pub search: SearchState,
    /// Confirmation screen.
    pub confirmation: ConfirmationState,
    /// Current screen.
    pub route: Route,
}

impl CheckinState {
    /// What the confirmation screen shows for the held registration.
    #[must_use]
    pub fn confirmation_view(&self) -> ConfirmationView<'_> {
        match &self.registration.current {
            Some(registration) if registration.allow_check_in => ConfirmationView::Ready {
                registration,
                loading: self.confirmation.loading,
                error: self.confirmation.error.as_ref(),
            },
            _ => ConfirmationView::Invalid,
        }
    }

    /// Whether a session is active.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.session.current.is_some()
    }
}
