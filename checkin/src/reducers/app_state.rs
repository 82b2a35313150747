//! App state reactions to the session.

use crate::state::{CheckinState, SessionChange};

/// Derive the profile when a session starts; forget everything when it ends.
pub fn on_session_change(state: &mut CheckinState, change: SessionChange) {
    match change {
        SessionChange::Established => state.app.set_profile_from_user(state.session.user()),
        SessionChange::Cleared => state.app.clear(),
    }
}
