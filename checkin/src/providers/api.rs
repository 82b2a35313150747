//! Event-management API provider.

use checkin_api::{
    ApiReply, AuthSession, CheckinClient, ConfirmRequest, EventSummary, Id, RegistrationResource,
    SearchRequest,
};
use std::future::Future;

/// Remote API used by the reducers.
///
/// Calls never fail outright: every outcome, including transport failures,
/// is an [`ApiReply`] so the caller can still inspect the response body.
pub trait CheckinApi: Send + Sync {
    /// Exchange credentials for a token and user.
    fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ApiReply<AuthSession>> + Send;

    /// Events available to the token holder.
    fn list_events(
        &self,
        token: &str,
        selected: Option<&Id>,
    ) -> impl Future<Output = ApiReply<Vec<EventSummary>>> + Send;

    /// Look up a scanned code within an event.
    fn validate_registration(
        &self,
        token: &str,
        event: &Id,
        code: &str,
    ) -> impl Future<Output = ApiReply<RegistrationResource>> + Send;

    /// Search registrations of an event.
    fn search_registrations(
        &self,
        token: &str,
        search: &SearchRequest,
    ) -> impl Future<Output = ApiReply<Vec<RegistrationResource>>> + Send;

    /// Check a registration in.
    fn confirm_check_in(
        &self,
        token: &str,
        confirm: &ConfirmRequest,
    ) -> impl Future<Output = ApiReply<()>> + Send;
}

impl CheckinApi for CheckinClient {
    fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = ApiReply<AuthSession>> + Send {
        Self::authenticate(self, email, password)
    }

    fn list_events(
        &self,
        token: &str,
        selected: Option<&Id>,
    ) -> impl Future<Output = ApiReply<Vec<EventSummary>>> + Send {
        Self::list_events(self, token, selected)
    }

    fn validate_registration(
        &self,
        token: &str,
        event: &Id,
        code: &str,
    ) -> impl Future<Output = ApiReply<RegistrationResource>> + Send {
        Self::validate_registration(self, token, event, code)
    }

    fn search_registrations(
        &self,
        token: &str,
        search: &SearchRequest,
    ) -> impl Future<Output = ApiReply<Vec<RegistrationResource>>> + Send {
        Self::search_registrations(self, token, search)
    }

    fn confirm_check_in(
        &self,
        token: &str,
        confirm: &ConfirmRequest,
    ) -> impl Future<Output = ApiReply<()>> + Send {
        Self::confirm_check_in(self, token, confirm)
    }
}
