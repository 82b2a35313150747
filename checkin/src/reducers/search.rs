//! Registration search reducer.

use super::{CheckinReducer, Effects};
use crate::actions::{CheckinAction, SearchAction};
use crate::environment::CheckinEnvironment;
use crate::error::{CheckinError, Operation};
use crate::providers::{CheckinApi, SecureStorage};
use crate::state::{CheckinState, Route, SearchState, SessionChange};
use checkin_api::{ApiError, SearchRequest};
use checkin_core::{async_effect, smallvec};

const EMPTY_QUERY: &str = "Enter a value to search.";

/// Forget the search when the session ends.
pub fn on_session_change(state: &mut CheckinState, change: SessionChange) {
    if change == SessionChange::Cleared {
        state.search = SearchState::default();
    }
}

impl<A, S> CheckinReducer<A, S>
where
    A: CheckinApi + Clone + 'static,
    S: SecureStorage + Clone + 'static,
{
    pub(crate) fn reduce_search(
        &self,
        state: &mut CheckinState,
        action: SearchAction,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        match action {
            SearchAction::QueryChanged(query) => {
                state.search.query = query;
                smallvec![]
            },

            SearchAction::ParameterChanged(parameter) => {
                state.search.parameter = parameter;
                smallvec![]
            },

            SearchAction::Submit => {
                if state.search.loading {
                    tracing::debug!("Search already in flight");
                    return smallvec![];
                }
                let Some(token) = state.session.token().map(str::to_string) else {
                    state.search.error = Some(CheckinError::session_expired());
                    return smallvec![];
                };
                let Some(event) = state.app.event_id().cloned() else {
                    return self.navigate(state, Route::EventSelection, env);
                };

                let value = state.search.query.trim().to_string();
                if value.is_empty() {
                    state.search.reset_results();
                    state.search.error = Some(CheckinError::ValidationInput(EMPTY_QUERY.to_string()));
                    return smallvec![];
                }

                state.search.reset_results();
                state.search.loading = true;
                let request = SearchRequest {
                    value,
                    parameter: state.search.parameter,
                    event: event.clone(),
                };
                tracing::info!(event = %event, parameter = %request.parameter, "Searching registrations");

                let api = env.api.clone();
                smallvec![async_effect! {
                    let reply = api.search_registrations(&token, &request).await;
                    Some(CheckinAction::Search(SearchAction::Completed { event, reply }))
                }]
            },

            SearchAction::Completed { event, reply } => {
                state.search.loading = false;
                if !state.is_signed_in() {
                    tracing::debug!("Discarding search received after sign-out");
                    return smallvec![];
                }
                state.app.apply_stats_from_response(reply.payload.as_ref());

                if matches!(reply.result, Err(ApiError::Unauthorized { .. })) {
                    return self.expire_session(state, env);
                }
                if state.app.event_id() != Some(&event) {
                    tracing::debug!(event = %event, "Discarding results for a previous event");
                    return smallvec![];
                }

                state.search.searched = true;
                match reply.result {
                    Ok(results) => {
                        tracing::debug!(count = results.len(), "Search finished");
                        state.search.results = results;
                    },
                    Err(error) => {
                        tracing::warn!(%error, "Search failed");
                        state.search.error = Some(CheckinError::from_api(&error, Operation::Search));
                    },
                }
                smallvec![]
            },

            SearchAction::SelectResult { index } => {
                let Some(registration) = state.search.results.get(index).cloned() else {
                    tracing::warn!(index, "No search result at index");
                    return smallvec![];
                };
                state.registration.set(Some(registration));
                self.navigate(state, Route::Confirmation, env)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::actions::{CheckinAction, SearchAction};
    use crate::error::CheckinError;
    use crate::state::{CheckinState, Route, ScanPhase};
    use checkin_api::{ApiError, ApiReply, Id, SearchParameter};
    use checkin_testing::ReducerTest;
    use checkin_testing::assertions::{assert_future_count, assert_no_effects};

    fn search_screen(query: &str) -> CheckinState {
        let mut state = scanning_state();
        state.route = Route::Search;
        state.scan.focused = false;
        state.scan.phase = ScanPhase::Inactive;
        state.search.query = query.to_string();
        state
    }

    #[test]
    fn test_whitespace_query_sends_nothing() {
        let (env, _) = env();
        let mut state = search_screen("   ");
        state.search.results = vec![registration(true)];
        state.search.searched = true;

        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(state)
            .when_action(SearchAction::Submit.into())
            .then_state(|state| {
                assert!(!state.search.loading);
                assert!(state.search.results.is_empty());
                assert!(!state.search.searched);
                assert!(matches!(state.search.error, Some(CheckinError::ValidationInput(_))));
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_submit_sends_trimmed_query_for_event() {
        use crate::mocks::RecordedRequest;
        use checkin_core::{effect::Effect, reducer::Reducer};

        let (env, _) = env();
        let mut state = search_screen("  4521 ");
        let reducer = reducer();
        let _ = reducer.reduce(
            &mut state,
            SearchAction::ParameterChanged(SearchParameter::IdentificationNumber).into(),
            &env,
        );
        let effects = reducer.reduce(&mut state, SearchAction::Submit.into(), &env);
        assert!(state.search.loading);

        for effect in effects {
            if let Effect::Future(future) = effect {
                let _ = future.await;
            }
        }
        let requests = env.api.requests();
        let [RecordedRequest::Search { token, request }] = requests.as_slice() else {
            unreachable!("expected one search request, got {requests:?}");
        };
        assert_eq!(token, "tok");
        assert_eq!(request.value, "4521");
        assert_eq!(request.parameter, SearchParameter::IdentificationNumber);
        assert_eq!(request.event, Id::new("7"));
    }

    #[test]
    fn test_submit_without_event_redirects() {
        let (env, _) = env();
        let mut state = search_screen("512");
        state.app.event = None;

        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(state)
            .when_action(SearchAction::Submit.into())
            .then_state(|state| {
                assert_eq!(state.route, Route::EventSelection);
                assert!(!state.search.loading);
            })
            // event list load only
            .then_effects(|effects| assert_future_count(effects, 1))
            .run();
    }

    #[test]
    fn test_submit_without_session_reports_expiry() {
        let (env, _) = env();
        let mut state = search_screen("512");
        state.session.current = None;

        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(state)
            .when_action(SearchAction::Submit.into())
            .then_state(|state| {
                assert!(state.search.error.as_ref().is_some_and(CheckinError::is_auth_expired));
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn test_results_are_shown() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(search_screen("512"))
            .given_actions([SearchAction::Submit.into()])
            .when_action(
                SearchAction::Completed {
                    event: Id::new("7"),
                    reply: ApiReply::new(None, Ok(vec![registration(true), registration(false)])),
                }
                .into(),
            )
            .then_state(|state| {
                assert!(!state.search.loading);
                assert!(state.search.searched);
                assert_eq!(state.search.results.len(), 2);
            })
            .run();
    }

    #[test]
    fn test_results_for_previous_event_are_discarded() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(search_screen("512"))
            .when_action(
                SearchAction::Completed {
                    event: Id::new("6"),
                    reply: ApiReply::new(None, Ok(vec![registration(true)])),
                }
                .into(),
            )
            .then_state(|state| {
                assert!(state.search.results.is_empty());
                assert!(!state.search.searched);
            })
            .run();
    }

    #[test]
    fn test_failed_search_keeps_status_in_message() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(search_screen("512"))
            .when_action(
                SearchAction::Completed {
                    event: Id::new("7"),
                    reply: ApiReply::failed(ApiError::Rejected {
                        status: 502,
                        message: None,
                    }),
                }
                .into(),
            )
            .then_state(|state| {
                assert!(state.search.searched);
                assert_eq!(
                    state.search.error.as_ref().map(ToString::to_string).as_deref(),
                    Some("Search failed. (502)")
                );
            })
            .run();
    }

    #[test]
    fn test_forbidden_search_signs_out() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(search_screen("512"))
            .when_action(
                SearchAction::Completed {
                    event: Id::new("7"),
                    reply: ApiReply::failed(ApiError::Unauthorized { message: None }),
                }
                .into(),
            )
            .then_state(|state| {
                assert!(!state.is_signed_in());
                assert_eq!(state.route, Route::Login);
                assert_eq!(state.search.query, "");
            })
            .run();
    }

    #[test]
    fn test_selecting_result_opens_confirmation() {
        let (env, _) = env();
        let mut state = search_screen("512");
        state.search.results = vec![registration(false), registration(true)];

        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(state)
            .when_action(CheckinAction::from(SearchAction::SelectResult { index: 1 }))
            .then_state(|state| {
                assert_eq!(state.registration.current, Some(registration(true)));
                assert_eq!(state.route, Route::Confirmation);
            })
            .run();
    }
}
