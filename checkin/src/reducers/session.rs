//! Session store reducer.
//!
//! Owns the signed-in session and its persistence. Dependent stores react
//! through the session observers registered on [`CheckinReducer`].

use super::{CheckinReducer, Effects};
use crate::actions::{CheckinAction, SessionAction};
use crate::environment::CheckinEnvironment;
use crate::providers::{CheckinApi, SecureStorage, persist_session, purge_session, restore_session};
use crate::state::{CheckinState, Route, Session, SessionChange};
use checkin_core::{async_effect, smallvec};

impl<A, S> CheckinReducer<A, S>
where
    A: CheckinApi + Clone + 'static,
    S: SecureStorage + Clone + 'static,
{
    pub(crate) fn reduce_session(
        &self,
        state: &mut CheckinState,
        action: SessionAction,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        match action {
            SessionAction::Restore => {
                state.session.restoring = true;
                let storage = env.storage.clone();
                smallvec![async_effect! {
                    let session = restore_session(&storage).await;
                    Some(CheckinAction::Session(SessionAction::Restored { session }))
                }]
            },

            SessionAction::Restored { session } => {
                state.session.restoring = false;
                if state.is_signed_in() {
                    tracing::debug!("Signed in while restoring, keeping current session");
                    return smallvec![];
                }
                match session {
                    Some(session) => {
                        tracing::info!("Restored remembered session");
                        state.session.current = Some(session);
                        state.session.remember_me = true;
                        self.notify_session_observers(state, SessionChange::Established);
                        self.navigate(state, Route::Scan, env)
                    },
                    None => self.navigate(state, Route::Login, env),
                }
            },

            SessionAction::SetRememberMe(remember_me) => {
                state.session.remember_me = remember_me;
                smallvec![]
            },

            SessionAction::SetSession { user, token } => {
                self.set_session(state, Session { token, user }, env)
            },

            SessionAction::ClearSession => {
                tracing::info!("Signing out");
                let mut effects = self.clear_session(state, env);
                state.login.error = None;
                state.login.notice = None;
                effects.extend(self.navigate(state, Route::Login, env));
                effects
            },
        }
    }

    /// Establish `session` and persist it according to remember-me.
    pub(crate) fn set_session(
        &self,
        state: &mut CheckinState,
        session: Session,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        state.session.current = Some(session.clone());
        self.notify_session_observers(state, SessionChange::Established);

        let storage = env.storage.clone();
        let queue = env.storage_queue.clone();
        let ticket = queue.ticket();
        let remember_me = state.session.remember_me;
        smallvec![async_effect! {
            let persisted = queue
                .run(ticket, persist_session(&storage, &session, remember_me))
                .await;
            if let Some(Err(error)) = persisted {
                tracing::warn!(%error, "Failed to persist session");
            }
            None
        }]
    }

    /// End the session and purge persisted credentials.
    ///
    /// Remember-me keeps its value. Clearing twice is the same as once.
    pub(crate) fn clear_session(
        &self,
        state: &mut CheckinState,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        state.session.current = None;
        self.notify_session_observers(state, SessionChange::Cleared);

        let storage = env.storage.clone();
        let queue = env.storage_queue.clone();
        let ticket = queue.ticket();
        smallvec![async_effect! {
            if let Some(Err(error)) = queue.run(ticket, purge_session(&storage)).await {
                tracing::warn!(%error, "Failed to purge persisted session");
            }
            None
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::actions::{CheckinAction, SessionAction};
    use crate::state::{CheckinState, Route, ScanPhase};
    use checkin_testing::ReducerTest;
    use checkin_testing::assertions::{assert_future_count, assert_no_effects};
    use serde_json::json;

    #[test]
    fn test_restore_reads_storage() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(CheckinState::default())
            .when_action(SessionAction::Restore.into())
            .then_state(|state| assert!(state.session.restoring))
            .then_effects(|effects| assert_future_count(effects, 1))
            .run();
    }

    #[test]
    fn test_restored_session_turns_remember_me_on() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(CheckinState::default())
            .when_action(
                SessionAction::Restored {
                    session: Some(session()),
                }
                .into(),
            )
            .then_state(|state| {
                assert!(!state.session.restoring);
                assert!(state.session.remember_me);
                assert_eq!(state.session.token(), Some("tok"));
                assert_eq!(state.app.profile.as_ref().map(|p| p.name.as_str()), Some("Staff"));
                // No event yet: the scanner sends the user to pick one
                assert_eq!(state.route, Route::EventSelection);
            })
            .run();
    }

    #[test]
    fn test_nothing_restored_shows_login() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(CheckinState::default())
            .when_action(SessionAction::Restored { session: None }.into())
            .then_state(|state| {
                assert!(!state.session.restoring);
                assert!(!state.session.remember_me);
                assert_eq!(state.route, Route::Login);
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn test_set_session_persists_and_derives_profile() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(CheckinState::default())
            .given_actions([SessionAction::SetRememberMe(true).into()])
            .when_action(
                SessionAction::SetSession {
                    user: json!({ "email": "door@example.com" }),
                    token: "t-2".into(),
                }
                .into(),
            )
            .then_state(|state| {
                assert_eq!(state.session.token(), Some("t-2"));
                assert_eq!(
                    state.app.profile.as_ref().map(|p| p.name.as_str()),
                    Some("Team Member")
                );
            })
            .then_effects(|effects| assert_future_count(effects, 1))
            .run();
    }

    #[test]
    fn test_clear_session_resets_dependent_stores() {
        let (env, _) = env();
        let mut state = scanning_state();
        state.session.remember_me = true;
        state.registration.set(Some(registration(true)));
        state.search.results = vec![registration(false)];

        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(state)
            .when_action(SessionAction::ClearSession.into())
            .then_state(|state| {
                assert!(!state.is_signed_in());
                assert!(state.session.remember_me);
                assert_eq!(state.app, crate::state::AppState::default());
                assert_eq!(state.registration.current, None);
                assert!(state.search.results.is_empty());
                assert_eq!(state.route, Route::Login);
                assert_eq!(state.scan.phase, ScanPhase::Inactive);
            })
            .then_effects(|effects| assert_future_count(effects, 1))
            .run();
    }

    #[test]
    fn test_clear_session_twice_equals_once() {
        use checkin_core::reducer::Reducer;

        let (env, _) = env();
        let reducer = reducer();
        let mut state = scanning_state();

        let _ = reducer.reduce(&mut state, CheckinAction::from(SessionAction::ClearSession), &env);
        let once = state.clone();
        let _ = reducer.reduce(&mut state, CheckinAction::from(SessionAction::ClearSession), &env);

        assert_eq!(state, once);
    }
}
