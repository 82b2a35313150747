//! Check-in reducers.
//!
//! One root reducer owns the whole [`CheckinState`]. Each flow lives in its
//! own module as an `impl` block on [`CheckinReducer`]:
//!
//! | Module | Actions |
//! |---|---|
//! | `session` | [`SessionAction`](crate::actions::SessionAction) |
//! | `login` | [`LoginAction`](crate::actions::LoginAction) |
//! | `events` | [`EventsAction`](crate::actions::EventsAction) |
//! | `scan` | [`ScanAction`](crate::actions::ScanAction) |
//! | `search` | [`SearchAction`](crate::actions::SearchAction) |
//! | `confirmation` | [`ConfirmationAction`](crate::actions::ConfirmationAction) |
//!
//! `app_state` and `registration` hold the session observers of the stores
//! they are named after.
//!
//! Everything one action changes happens inside a single `reduce` call, so a
//! 403 clears the session, the registration and the app state atomically.

pub mod app_state;
pub mod confirmation;
pub mod events;
pub mod login;
pub mod registration;
pub mod scan;
pub mod search;
pub mod session;

use crate::actions::CheckinAction;
use crate::config::ScanConfig;
use crate::environment::CheckinEnvironment;
use crate::providers::{CheckinApi, SecureStorage};
use crate::state::{CheckinState, Route, SessionChange};
use checkin_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::marker::PhantomData;

pub use scan::SCAN_REARM;

/// Effects returned by the check-in reducers.
pub type Effects = SmallVec<[Effect<CheckinAction>; 4]>;

/// Reaction of a dependent store to a session change.
///
/// Observers run inside the reduce call that changed the session.
pub type SessionObserver = fn(&mut CheckinState, SessionChange);

/// Root check-in reducer.
pub struct CheckinReducer<A, S> {
    scan: ScanConfig,
    observers: Vec<SessionObserver>,
    _phantom: PhantomData<fn() -> (A, S)>,
}

impl<A, S> CheckinReducer<A, S> {
    /// Create a reducer with the default session observers registered.
    ///
    /// The defaults clear the app state, the registration and the search
    /// results when the session ends, and derive the profile when it starts.
    #[must_use]
    pub fn new(scan: ScanConfig) -> Self {
        Self {
            scan,
            observers: vec![
                app_state::on_session_change,
                registration::on_session_change,
                search::on_session_change,
            ],
            _phantom: PhantomData,
        }
    }

    /// Register an additional session observer.
    #[must_use]
    pub fn with_session_observer(mut self, observer: SessionObserver) -> Self {
        self.observers.push(observer);
        self
    }

    /// Scanner timing in use.
    #[must_use]
    pub const fn scan_config(&self) -> ScanConfig {
        self.scan
    }

    fn notify_session_observers(&self, state: &mut CheckinState, change: SessionChange) {
        for observer in &self.observers {
            observer(state, change);
        }
    }
}

impl<A, S> Default for CheckinReducer<A, S> {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl<A, S> Clone for CheckinReducer<A, S> {
    fn clone(&self) -> Self {
        Self {
            scan: self.scan,
            observers: self.observers.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<A, S> std::fmt::Debug for CheckinReducer<A, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckinReducer")
            .field("scan", &self.scan)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<A, S> CheckinReducer<A, S>
where
    A: CheckinApi + Clone + 'static,
    S: SecureStorage + Clone + 'static,
{
    /// Show `route`, delivering focus changes to the scanner.
    ///
    /// Screens that need a session fall back to login without one; screens
    /// that need an event fall back to event selection without one.
    pub(crate) fn navigate(
        &self,
        state: &mut CheckinState,
        route: Route,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        let route = match route {
            Route::EventSelection | Route::Scan | Route::Search | Route::Confirmation
                if !state.is_signed_in() =>
            {
                Route::Login
            },
            Route::Search | Route::Confirmation if state.app.event.is_none() => {
                Route::EventSelection
            },
            other => other,
        };

        let previous = state.route;
        if previous == route {
            return smallvec![];
        }
        tracing::debug!(from = ?previous, to = ?route, "Navigating");
        state.route = route;

        let mut effects = Effects::new();
        if previous == Route::Scan {
            effects.extend(self.scan_focus_lost(state));
        }
        match route {
            Route::Scan => effects.extend(self.scan_focus_gained(state, env)),
            Route::EventSelection => effects.extend(self.load_events(state, env)),
            Route::Confirmation => state.confirmation.error = None,
            Route::Splash | Route::Login | Route::Search => {},
        }
        effects
    }

    /// Tear down after the server rejected the token (403).
    ///
    /// Clears the session and everything observing it, purges persisted
    /// credentials and shows the login screen.
    pub(crate) fn expire_session(
        &self,
        state: &mut CheckinState,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        tracing::warn!("Session rejected by server, signing out");
        let mut effects = self.clear_session(state, env);
        state.login.error = Some(crate::error::CheckinError::session_expired());
        effects.extend(self.navigate(state, Route::Login, env));
        effects
    }
}

impl<A, S> Reducer for CheckinReducer<A, S>
where
    A: CheckinApi + Clone + 'static,
    S: SecureStorage + Clone + 'static,
{
    type State = CheckinState;
    type Action = CheckinAction;
    type Environment = CheckinEnvironment<A, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            CheckinAction::Session(action) => self.reduce_session(state, action, env),
            CheckinAction::Login(action) => self.reduce_login(state, action, env),
            CheckinAction::Events(action) => self.reduce_events(state, action, env),
            CheckinAction::Scan(action) => self.reduce_scan(state, action, env),
            CheckinAction::Search(action) => self.reduce_search(state, action, env),
            CheckinAction::Confirmation(action) => self.reduce_confirmation(state, action, env),
            CheckinAction::Navigate(route) => self.navigate(state, route, env),
        }
    }
}
