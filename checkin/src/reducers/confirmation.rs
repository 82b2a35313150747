//! Confirmation screen reducer.
//!
//! Confirms the held registration. A failed confirm keeps the registration
//! so the staff member can retry; a successful one clears it and returns to
//! the scanner.

use super::{CheckinReducer, Effects};
use crate::actions::{CheckinAction, ConfirmationAction};
use crate::environment::CheckinEnvironment;
use crate::error::{CheckinError, Operation};
use crate::providers::{CheckinApi, SecureStorage};
use crate::state::{CheckinState, Route};
use checkin_api::{ApiError, ConfirmRequest};
use checkin_core::{async_effect, smallvec};

impl<A, S> CheckinReducer<A, S>
where
    A: CheckinApi + Clone + 'static,
    S: SecureStorage + Clone + 'static,
{
    pub(crate) fn reduce_confirmation(
        &self,
        state: &mut CheckinState,
        action: ConfirmationAction,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        match action {
            ConfirmationAction::Confirm => {
                if state.confirmation.loading {
                    tracing::debug!("Confirm already in flight");
                    return smallvec![];
                }
                let Some(token) = state.session.token().map(str::to_string) else {
                    tracing::warn!("Confirm without a session ignored");
                    return smallvec![];
                };
                let Some(event_id) = state.app.event_id().cloned() else {
                    return self.navigate(state, Route::EventSelection, env);
                };
                let Some(registration) = state
                    .registration
                    .current
                    .as_ref()
                    .filter(|registration| registration.allow_check_in)
                    .map(|registration| registration.id.clone())
                else {
                    tracing::debug!("Nothing to confirm");
                    return smallvec![];
                };

                tracing::info!(%registration, event = %event_id, "Confirming check-in");
                state.confirmation.loading = true;
                state.confirmation.error = None;
                let request = ConfirmRequest {
                    registration,
                    event_id,
                };
                let api = env.api.clone();
                smallvec![async_effect! {
                    let reply = api.confirm_check_in(&token, &request).await;
                    Some(CheckinAction::Confirmation(ConfirmationAction::Completed(reply)))
                }]
            },

            ConfirmationAction::Completed(reply) => {
                state.confirmation.loading = false;
                if !state.is_signed_in() {
                    tracing::debug!("Discarding confirmation received after sign-out");
                    return smallvec![];
                }
                state.app.apply_stats_from_response(reply.payload.as_ref());

                match reply.result {
                    Ok(()) => {
                        tracing::info!("Check-in confirmed");
                        state.registration.set(None);
                        self.navigate(state, Route::Scan, env)
                    },
                    Err(ApiError::Unauthorized { .. }) => self.expire_session(state, env),
                    Err(error) => {
                        tracing::warn!(%error, "Confirm failed");
                        state.confirmation.error = Some(CheckinError::from_api(&error, Operation::Confirm));
                        smallvec![]
                    },
                }
            },

            ConfirmationAction::BackToScan => self.navigate(state, Route::Scan, env),
        }
    }
}
