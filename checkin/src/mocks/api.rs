//! Mock event-management API for testing.

use crate::providers::CheckinApi;
use checkin_api::{
    ApiError, ApiReply, AuthSession, ConfirmRequest, EventSummary, Id, RegistrationResource,
    SearchRequest,
};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// A request received by [`MockCheckinApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedRequest {
    /// `POST /auth`
    Authenticate {
        /// Email sent
        email: String,
    },
    /// `GET /checkin/event-list`
    ListEvents {
        /// Bearer token sent
        token: String,
        /// Selected event sent
        selected: Option<Id>,
    },
    /// `GET /checkin/validation`
    Validate {
        /// Bearer token sent
        token: String,
        /// Event scope
        event: Id,
        /// Scanned code
        code: String,
    },
    /// `POST /checkin/search/`
    Search {
        /// Bearer token sent
        token: String,
        /// Request body
        request: SearchRequest,
    },
    /// `POST /checkin/confirm`
    Confirm {
        /// Bearer token sent
        token: String,
        /// Request body
        request: ConfirmRequest,
    },
}

/// Replies of one endpoint: scripted replies first, then the fallback.
#[derive(Debug)]
struct Endpoint<T> {
    scripted: VecDeque<ApiReply<T>>,
    fallback: ApiReply<T>,
}

impl<T: Clone> Endpoint<T> {
    fn unscripted(name: &str) -> Self {
        Self {
            scripted: VecDeque::new(),
            fallback: ApiReply::failed(ApiError::RequestFailed(format!("no reply scripted for {name}"))),
        }
    }

    fn next(&mut self) -> ApiReply<T> {
        self.scripted
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[derive(Debug)]
struct Inner {
    authenticate: Endpoint<AuthSession>,
    list_events: Endpoint<Vec<EventSummary>>,
    validate: Endpoint<RegistrationResource>,
    search: Endpoint<Vec<RegistrationResource>>,
    confirm: Endpoint<()>,
    requests: Vec<RecordedRequest>,
}

/// Scriptable API.
///
/// Each endpoint answers with queued replies in order, then repeats its
/// fallback reply. Every request is recorded. While the gate is closed,
/// replies are held back, which keeps requests in flight.
///
/// Clones share the script, the records and the gate.
#[derive(Debug, Clone)]
pub struct MockCheckinApi {
    inner: Arc<Mutex<Inner>>,
    gate: Arc<watch::Sender<bool>>,
}

impl Default for MockCheckinApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCheckinApi {
    /// Create a mock whose endpoints all fail until scripted.
    #[must_use]
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                authenticate: Endpoint::unscripted("authenticate"),
                list_events: Endpoint::unscripted("list_events"),
                validate: Endpoint::unscripted("validate_registration"),
                search: Endpoint::unscripted("search_registrations"),
                confirm: Endpoint::unscripted("confirm_check_in"),
                requests: Vec::new(),
            })),
            gate: Arc::new(gate),
        }
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> Option<R> {
        self.inner.lock().ok().map(|mut inner| f(&mut inner))
    }

    /// Queue a sign-in reply.
    pub fn push_authenticate(&self, reply: ApiReply<AuthSession>) {
        self.with_inner(|inner| inner.authenticate.scripted.push_back(reply));
    }

    /// Queue an event list reply.
    pub fn push_list_events(&self, reply: ApiReply<Vec<EventSummary>>) {
        self.with_inner(|inner| inner.list_events.scripted.push_back(reply));
    }

    /// Queue a validation reply.
    pub fn push_validation(&self, reply: ApiReply<RegistrationResource>) {
        self.with_inner(|inner| inner.validate.scripted.push_back(reply));
    }

    /// Answer every unqueued validation with `reply`.
    pub fn set_validation_fallback(&self, reply: ApiReply<RegistrationResource>) {
        self.with_inner(|inner| inner.validate.fallback = reply);
    }

    /// Queue a search reply.
    pub fn push_search(&self, reply: ApiReply<Vec<RegistrationResource>>) {
        self.with_inner(|inner| inner.search.scripted.push_back(reply));
    }

    /// Queue a confirm reply.
    pub fn push_confirm(&self, reply: ApiReply<()>) {
        self.with_inner(|inner| inner.confirm.scripted.push_back(reply));
    }

    /// Hold every reply until [`MockCheckinApi::open_gate`].
    pub fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    /// Release held replies.
    pub fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.with_inner(|inner| inner.requests.clone()).unwrap_or_default()
    }

    /// Number of validation requests received.
    #[must_use]
    pub fn validation_count(&self) -> usize {
        self.count(|request| matches!(request, RecordedRequest::Validate { .. }))
    }

    /// Number of search requests received.
    #[must_use]
    pub fn search_count(&self) -> usize {
        self.count(|request| matches!(request, RecordedRequest::Search { .. }))
    }

    /// Number of confirm requests received.
    #[must_use]
    pub fn confirm_count(&self) -> usize {
        self.count(|request| matches!(request, RecordedRequest::Confirm { .. }))
    }

    /// Number of requests of any kind.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.count(|_| true)
    }

    fn count(&self, predicate: impl Fn(&RecordedRequest) -> bool) -> usize {
        self.with_inner(|inner| inner.requests.iter().filter(|r| predicate(r)).count())
            .unwrap_or_default()
    }

    /// Record a request and pick its reply; the reply waits for the gate.
    fn answer<T: Send + 'static>(
        &self,
        request: RecordedRequest,
        pick: impl FnOnce(&mut Inner) -> ApiReply<T>,
    ) -> impl Future<Output = ApiReply<T>> + Send + 'static {
        let reply = self
            .with_inner(|inner| {
                inner.requests.push(request);
                pick(inner)
            })
            .unwrap_or_else(|| ApiReply::failed(ApiError::RequestFailed("mock poisoned".to_string())));
        let mut gate = self.gate.subscribe();

        async move {
            let _ = gate.wait_for(|open| *open).await;
            reply
        }
    }
}

impl CheckinApi for MockCheckinApi {
    fn authenticate(
        &self,
        email: &str,
        _password: &str,
    ) -> impl Future<Output = ApiReply<AuthSession>> + Send {
        self.answer(
            RecordedRequest::Authenticate {
                email: email.to_string(),
            },
            |inner| inner.authenticate.next(),
        )
    }

    fn list_events(
        &self,
        token: &str,
        selected: Option<&Id>,
    ) -> impl Future<Output = ApiReply<Vec<EventSummary>>> + Send {
        self.answer(
            RecordedRequest::ListEvents {
                token: token.to_string(),
                selected: selected.cloned(),
            },
            |inner| inner.list_events.next(),
        )
    }

    fn validate_registration(
        &self,
        token: &str,
        event: &Id,
        code: &str,
    ) -> impl Future<Output = ApiReply<RegistrationResource>> + Send {
        self.answer(
            RecordedRequest::Validate {
                token: token.to_string(),
                event: event.clone(),
                code: code.to_string(),
            },
            |inner| inner.validate.next(),
        )
    }

    fn search_registrations(
        &self,
        token: &str,
        search: &SearchRequest,
    ) -> impl Future<Output = ApiReply<Vec<RegistrationResource>>> + Send {
        self.answer(
            RecordedRequest::Search {
                token: token.to_string(),
                request: search.clone(),
            },
            |inner| inner.search.next(),
        )
    }

    fn confirm_check_in(
        &self,
        token: &str,
        confirm: &ConfirmRequest,
    ) -> impl Future<Output = ApiReply<()>> + Send {
        self.answer(
            RecordedRequest::Confirm {
                token: token.to_string(),
                request: confirm.clone(),
            },
            |inner| inner.confirm.next(),
        )
    }
}
