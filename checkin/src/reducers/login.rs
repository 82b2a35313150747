//! Sign-in form reducer.

use super::{CheckinReducer, Effects};
use crate::actions::{CheckinAction, LoginAction};
use crate::environment::CheckinEnvironment;
use crate::error::{CheckinError, Operation};
use crate::providers::{CheckinApi, SecureStorage};
use crate::state::{CheckinState, Route, Session};
use checkin_core::{async_effect, smallvec};

const MISSING_CREDENTIALS: &str = "Please enter your email and password.";
const SIGNED_IN: &str = "Signed in successfully.";

impl<A, S> CheckinReducer<A, S>
where
    A: CheckinApi + Clone + 'static,
    S: SecureStorage + Clone + 'static,
{
    pub(crate) fn reduce_login(
        &self,
        state: &mut CheckinState,
        action: LoginAction,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        match action {
            LoginAction::Submit { email, password } => {
                if state.login.loading {
                    tracing::debug!("Sign-in already in flight");
                    return smallvec![];
                }
                state.login.error = None;
                state.login.notice = None;

                let email = email.trim().to_string();
                if email.is_empty() || password.is_empty() {
                    state.login.error = Some(CheckinError::ValidationInput(MISSING_CREDENTIALS.to_string()));
                    return smallvec![];
                }

                state.login.loading = true;
                let api = env.api.clone();
                smallvec![async_effect! {
                    let reply = api.authenticate(&email, &password).await;
                    Some(CheckinAction::Login(LoginAction::Completed(reply)))
                }]
            },

            LoginAction::Completed(reply) => {
                state.login.loading = false;
                state.app.apply_stats_from_response(reply.payload.as_ref());

                match reply.result {
                    Ok(auth) => {
                        tracing::info!("Signed in");
                        let mut effects = self.set_session(
                            state,
                            Session {
                                token: auth.token,
                                user: auth.user,
                            },
                            env,
                        );
                        state.login.notice = Some(SIGNED_IN.to_string());
                        effects.extend(self.navigate(state, Route::Scan, env));
                        effects
                    },
                    Err(error) => {
                        tracing::warn!(%error, "Sign-in failed");
                        state.login.error = Some(CheckinError::from_api(&error, Operation::Login));
                        smallvec![]
                    },
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::actions::{CheckinAction, LoginAction};
    use crate::error::CheckinError;
    use crate::mocks::RecordedRequest;
    use crate::state::{CheckinState, Route};
    use checkin_api::{ApiError, ApiReply, AuthSession};
    use checkin_testing::ReducerTest;
    use checkin_testing::assertions::{assert_future_count, assert_no_effects};
    use serde_json::json;

    fn login_screen() -> CheckinState {
        CheckinState {
            route: Route::Login,
            ..CheckinState::default()
        }
    }

    #[test]
    fn test_blank_credentials_send_nothing() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(login_screen())
            .when_action(
                LoginAction::Submit {
                    email: "   ".into(),
                    password: "secret".into(),
                }
                .into(),
            )
            .then_state(|state| {
                assert!(!state.login.loading);
                assert!(matches!(state.login.error, Some(CheckinError::ValidationInput(_))));
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_submit_trims_email() {
        use checkin_core::{effect::Effect, reducer::Reducer};

        let (env, _) = env();
        let mut state = login_screen();
        let effects = reducer().reduce(
            &mut state,
            LoginAction::Submit {
                email: " staff@example.com ".into(),
                password: "pw".into(),
            }
            .into(),
            &env,
        );

        assert!(state.login.loading);
        for effect in effects {
            if let Effect::Future(future) = effect {
                let _ = future.await;
            }
        }
        assert_eq!(
            env.api.requests(),
            vec![RecordedRequest::Authenticate {
                email: "staff@example.com".into()
            }]
        );
    }

    #[test]
    fn test_second_submit_while_loading_is_ignored() {
        let (env, _) = env();
        let submit = || -> CheckinAction {
            LoginAction::Submit {
                email: "a@b.c".into(),
                password: "pw".into(),
            }
            .into()
        };
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(login_screen())
            .given_actions([submit()])
            .when_action(submit())
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn test_success_establishes_session() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(login_screen())
            .when_action(
                LoginAction::Completed(ApiReply::new(
                    Some(json!({ "stats": { "logins": 1 } })),
                    Ok(AuthSession {
                        token: "tok".into(),
                        user: json!({ "name": "Ana" }),
                    }),
                ))
                .into(),
            )
            .then_state(|state| {
                assert!(!state.login.loading);
                assert_eq!(state.session.token(), Some("tok"));
                assert_eq!(state.login.notice.as_deref(), Some("Signed in successfully."));
                assert!(state.app.stats.is_some());
                assert_eq!(state.route, Route::EventSelection);
            })
            // persist + event list load
            .then_effects(|effects| assert_future_count(effects, 2))
            .run();
    }

    #[test]
    fn test_rejected_sign_in_shows_server_message() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(login_screen())
            .when_action(
                LoginAction::Completed(ApiReply::failed(ApiError::Rejected {
                    status: 401,
                    message: Some("Invalid credentials".into()),
                }))
                .into(),
            )
            .then_state(|state| {
                assert!(!state.is_signed_in());
                assert_eq!(
                    state.login.error.as_ref().map(ToString::to_string).as_deref(),
                    Some("Invalid credentials")
                );
                assert_eq!(state.route, Route::Login);
            })
            .then_effects(assert_no_effects)
            .run();
    }

    #[test]
    fn test_forbidden_sign_in_shows_server_message() {
        let (env, _) = env();
        ReducerTest::new(reducer())
            .with_env(env)
            .given_state(login_screen())
            .when_action(
                LoginAction::Completed(ApiReply::failed(ApiError::Unauthorized {
                    message: Some("Account disabled".into()),
                }))
                .into(),
            )
            .then_state(|state| {
                assert_eq!(
                    state.login.error.as_ref().map(ToString::to_string).as_deref(),
                    Some("Account disabled")
                );
                assert_eq!(state.route, Route::Login);
            })
            .then_effects(assert_no_effects)
            .run();
    }
}
