//! Event list and selection reducer.

use super::{CheckinReducer, Effects};
use crate::actions::{CheckinAction, EventsAction};
use crate::environment::CheckinEnvironment;
use crate::error::{CheckinError, Operation};
use crate::providers::{CheckinApi, SecureStorage};
use crate::state::{AppEvent, CheckinState, Route};
use checkin_api::ApiError;
use checkin_core::{async_effect, smallvec};

impl<A, S> CheckinReducer<A, S>
where
    A: CheckinApi + Clone + 'static,
    S: SecureStorage + Clone + 'static,
{
    pub(crate) fn reduce_events(
        &self,
        state: &mut CheckinState,
        action: EventsAction,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        match action {
            EventsAction::Load => self.load_events(state, env),

            EventsAction::Loaded(reply) => {
                state.app.events_loading = false;
                if !state.is_signed_in() {
                    tracing::debug!("Discarding event list received after sign-out");
                    return smallvec![];
                }
                state.app.apply_stats_from_response(reply.payload.as_ref());

                match reply.result {
                    Ok(events) => {
                        tracing::debug!(count = events.len(), "Events loaded");
                        state.app.events = events;
                        state.app.events_error = None;
                        smallvec![]
                    },
                    Err(ApiError::Unauthorized { .. }) => self.expire_session(state, env),
                    Err(error) => {
                        tracing::warn!(%error, "Loading events failed");
                        state.app.events_error = Some(CheckinError::from_api(&error, Operation::ListEvents));
                        smallvec![]
                    },
                }
            },

            EventsAction::Select { id } => {
                let Some(event) = state.app.events.iter().find(|event| event.id == id) else {
                    tracing::warn!(event = %id, "Selected event is not in the list");
                    return smallvec![];
                };

                let event = AppEvent::from(event.clone());
                tracing::info!(event = %event.id, name = %event.name, "Event selected");
                if state.app.set_event(Some(event)) {
                    state.search.reset_results();
                }
                self.navigate(state, Route::Scan, env)
            },
        }
    }

    /// Fetch the event list, unless signed out or already loading.
    pub(crate) fn load_events(
        &self,
        state: &mut CheckinState,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        let Some(token) = state.session.token().map(str::to_string) else {
            return smallvec![];
        };
        if state.app.events_loading {
            return smallvec![];
        }

        state.app.events_loading = true;
        state.app.events_error = None;
        let selected = state.app.event_id().cloned();
        let api = env.api.clone();
        smallvec![async_effect! {
            let reply = api.list_events(&token, selected.as_ref()).await;
            Some(CheckinAction::Events(EventsAction::Loaded(reply)))
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::actions::EventsAction;
    use crate::state::{CheckinState, Route};
    use checkin_api::{ApiError, ApiReply, EventSummary, Id};
    use checkin_testing::ReducerTest;
    use checkin_testing::assertions::{assert_future_count, assert_no_effects};

    fn picking_state() -> CheckinState {
        let mut state = scanning_state();
        state.app.event = None;
        state.route = Route::EventSelection;
        state.scan.focused = false;
        state.scan.phase = crate::state::ScanPhase::Inactive;
        state.app.events = vec![
            EventSummary {
                id: Id::new("7"),
                name: "Trail".into(),
            },
            EventSummary {
                id: Id::new("8"),
                name: "Road".into(),
            },
        ];
        state
    }

    #[test]
    fn test_load_is_single_flight() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(picking_state())
            .given_actions([EventsAction::Load.into()])
            .when_action(EventsAction::Load.into())
            .then_state(|state| assert!(state.app.events_loading))
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn test_load_requires_session() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(CheckinState::default())
            .when_action(EventsAction::Load.into())
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn test_select_sets_event_and_opens_scanner() {
        let (env, _) = env();
        let mut state = picking_state();
        state.search.results = vec![registration(true)];
        state.search.searched = true;

        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(state)
            .when_action(EventsAction::Select { id: Id::new("8") }.into())
            .then_state(|state| {
                assert_eq!(state.app.event_id(), Some(&Id::new("8")));
                assert!(state.search.results.is_empty());
                assert!(!state.search.searched);
                assert_eq!(state.route, Route::Scan);
                assert!(state.scan.accepts_codes());
            })
            .run();
    }

    #[test]
    fn test_unknown_event_is_not_selected() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(picking_state())
            .when_action(EventsAction::Select { id: Id::new("99") }.into())
            .then_state(|state| {
                assert_eq!(state.app.event, None);
                assert_eq!(state.route, Route::EventSelection);
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn test_forbidden_list_signs_out() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(picking_state())
            .when_action(EventsAction::Loaded(ApiReply::failed(ApiError::Unauthorized { message: None })).into())
            .then_state(|state| {
                assert!(!state.is_signed_in());
                assert!(state.app.events.is_empty());
                assert_eq!(state.route, Route::Login);
                assert!(state.login.error.as_ref().is_some_and(|e| e.is_auth_expired()));
            })
            // purge
            .then_effects(|effects| assert_future_count(effects, 1))
            .run();
    }

    #[test]
    fn test_failed_list_keeps_previous_events() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(picking_state())
            .when_action(
                EventsAction::Loaded(ApiReply::failed(ApiError::Rejected {
                    status: 500,
                    message: None,
                }))
                .into(),
            )
            .then_state(|state| {
                assert_eq!(state.app.events.len(), 2);
                assert_eq!(
                    state.app.events_error.as_ref().map(ToString::to_string).as_deref(),
                    Some("Unable to load events (500)")
                );
            })
            .run();
    }
}
