//! Registration store reactions to the session.

use crate::state::{CheckinState, ConfirmationState, SessionChange};

/// Drop the held registration when the session ends.
pub fn on_session_change(state: &mut CheckinState, change: SessionChange) {
    if change == SessionChange::Cleared {
        state.registration.set(None);
        state.confirmation = ConfirmationState::default();
    }
}
