//! Scanner state machine.
//!
//! ```text
//!            FocusGained              CodeScanned
//! Inactive ─────────────▶ Idle ─────────────────────▶ Processing
//!                          ▲                            │     │
//!                          │ RearmScanner      failure  │     │ success
//!                          └──────────── Cooldown ◀─────┘     ▼
//!                                                        Confirmation
//! ```
//!
//! `FocusLost` moves every phase to `Inactive`.
//!
//! At most one validation is in flight. Reads are dropped while processing,
//! during the cooldown and when the scanner is not focused. A read equal to
//! the last accepted one within the cooldown window is dropped as a
//! duplicate. After a failure the scanner re-arms once a full cooldown has
//! elapsed since the attempt started.
//!
//! The re-arm timer runs under [`SCAN_REARM`] and carries the generation it
//! was scheduled under; focus changes bump the generation so a timer that
//! slips through cancellation is ignored.

use super::{CheckinReducer, Effects};
use crate::actions::{CheckinAction, ScanAction};
use crate::environment::CheckinEnvironment;
use crate::error::{CheckinError, Operation};
use crate::providers::{CheckinApi, SecureStorage};
use crate::state::{CheckinState, Route, ScanAttempt, ScanPhase};
use checkin_api::{ApiError, ApiReply, Id, RegistrationResource};
use checkin_core::effect::{Effect, EffectId};
use checkin_core::{DateTime, Utc, async_effect, delay, smallvec};

/// Id of the scanner re-arm timer.
pub const SCAN_REARM: EffectId = EffectId::new("scan.rearm");

impl<A, S> CheckinReducer<A, S>
where
    A: CheckinApi + Clone + 'static,
    S: SecureStorage + Clone + 'static,
{
    pub(crate) fn reduce_scan(
        &self,
        state: &mut CheckinState,
        action: ScanAction,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        match action {
            ScanAction::CodeScanned { value } => self.code_scanned(state, value, env),

            ScanAction::ValidationCompleted {
                event,
                started_at,
                reply,
            } => self.validation_completed(state, &event, started_at, reply, env),

            ScanAction::RearmScanner { generation } => {
                if generation != state.scan.rearm_generation || state.scan.phase != ScanPhase::Cooldown {
                    tracing::debug!(generation, "Ignoring stale re-arm");
                    return smallvec![];
                }
                if state.scan.focused {
                    state.scan.phase = ScanPhase::Idle;
                    state.scan.last_scan = None;
                } else {
                    state.scan.phase = ScanPhase::Inactive;
                }
                smallvec![]
            },

            ScanAction::FocusGained => {
                if state.route != Route::Scan {
                    tracing::debug!(route = ?state.route, "Scanner focus outside the scan screen");
                    return smallvec![];
                }
                self.scan_focus_gained(state, env)
            },

            ScanAction::FocusLost => self.scan_focus_lost(state),
        }
    }

    fn code_scanned(
        &self,
        state: &mut CheckinState,
        value: String,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        if !state.scan.accepts_codes() {
            tracing::debug!(phase = ?state.scan.phase, "Scanner not accepting codes");
            return smallvec![];
        }

        let now = env.clock.now();
        if let Some(last) = &state.scan.last_scan {
            let within_cooldown = (now - last.at)
                .to_std()
                .is_ok_and(|elapsed| elapsed < self.scan.cooldown);
            if last.value == value && within_cooldown {
                tracing::debug!("Dropping duplicate read");
                return smallvec![];
            }
        }
        state.scan.last_scan = Some(ScanAttempt {
            value: value.clone(),
            at: now,
        });

        let Some(event) = state.app.event_id().cloned() else {
            tracing::debug!("No event selected, redirecting before validation");
            return self.navigate(state, Route::EventSelection, env);
        };

        state.scan.attempt_started_at = Some(now);
        state.scan.error = None;

        let Some(token) = state.session.token().map(str::to_string) else {
            tracing::warn!("Read received without a session");
            state.scan.error = Some(CheckinError::session_expired());
            return self.schedule_rearm(state, now, env);
        };

        tracing::info!(event = %event, "Validating scanned code");
        state.scan.in_flight = true;
        state.scan.phase = ScanPhase::Processing;
        let api = env.api.clone();
        smallvec![async_effect! {
            let reply = api.validate_registration(&token, &event, &value).await;
            Some(CheckinAction::Scan(ScanAction::ValidationCompleted {
                event,
                started_at: now,
                reply,
            }))
        }]
    }

    fn validation_completed(
        &self,
        state: &mut CheckinState,
        event: &Id,
        started_at: DateTime<Utc>,
        reply: ApiReply<RegistrationResource>,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        state.scan.in_flight = false;
        if !state.is_signed_in() {
            tracing::debug!("Discarding validation received after sign-out");
            return smallvec![];
        }
        state.app.apply_stats_from_response(reply.payload.as_ref());

        if matches!(reply.result, Err(ApiError::Unauthorized { .. })) {
            return self.expire_session(state, env);
        }
        if state.app.event_id() != Some(event) {
            tracing::debug!(event = %event, "Discarding validation for a previous event");
            if state.scan.phase == ScanPhase::Processing {
                state.scan.phase = if state.scan.focused {
                    ScanPhase::Idle
                } else {
                    ScanPhase::Inactive
                };
            }
            return smallvec![];
        }

        match reply.result {
            Ok(registration) => {
                tracing::info!(registration = %registration.id, "Registration validated");
                state.registration.set(Some(registration));
                if state.scan.focused {
                    state.scan.phase = ScanPhase::Idle;
                    self.navigate(state, Route::Confirmation, env)
                } else {
                    state.scan.phase = ScanPhase::Inactive;
                    smallvec![]
                }
            },
            Err(error) => {
                tracing::warn!(%error, "Validation failed");
                state.scan.error = Some(CheckinError::from_api(&error, Operation::Validation));
                if state.scan.focused {
                    self.schedule_rearm(state, started_at, env)
                } else {
                    state.scan.phase = ScanPhase::Inactive;
                    smallvec![]
                }
            },
        }
    }

    /// Enter the cooldown and re-arm once a full cooldown has passed since
    /// `started_at`.
    fn schedule_rearm(
        &self,
        state: &mut CheckinState,
        started_at: DateTime<Utc>,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        let elapsed = (env.clock.now() - started_at).to_std().unwrap_or_default();
        let remaining = self.scan.cooldown.saturating_sub(elapsed);

        state.scan.phase = ScanPhase::Cooldown;
        state.scan.rearm_generation += 1;
        let generation = state.scan.rearm_generation;
        tracing::debug!(?remaining, generation, "Scanner cooling down");

        smallvec![
            delay! {
                duration: remaining,
                action: CheckinAction::Scan(ScanAction::RearmScanner { generation })
            }
            .cancellable(SCAN_REARM)
        ]
    }

    /// The scan screen became visible.
    ///
    /// Discards any pending re-arm and arms the scanner, unless a validation
    /// is still in flight. Without an event the user is sent to pick one.
    pub(crate) fn scan_focus_gained(
        &self,
        state: &mut CheckinState,
        env: &CheckinEnvironment<A, S>,
    ) -> Effects {
        state.scan.focused = true;
        state.scan.rearm_generation += 1;
        state.scan.error = None;
        state.scan.last_scan = None;
        state.scan.phase = if state.scan.in_flight {
            ScanPhase::Processing
        } else {
            ScanPhase::Idle
        };

        let mut effects: Effects = smallvec![Effect::Cancel(SCAN_REARM)];
        if state.is_signed_in() && state.app.event.is_none() {
            effects.extend(self.navigate(state, Route::EventSelection, env));
        }
        effects
    }

    /// The scan screen was hidden.
    pub(crate) fn scan_focus_lost(&self, state: &mut CheckinState) -> Effects {
        state.scan.focused = false;
        state.scan.rearm_generation += 1;
        state.scan.phase = ScanPhase::Inactive;
        smallvec![Effect::Cancel(SCAN_REARM)]
    }
}
