//! Check-in API client implementation

use crate::{
    envelope,
    error::ApiError,
    types::{
        ApiReply, AuthSession, ConfirmRequest, EventSummary, Id, RegistrationResource,
        SearchRequest,
    },
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;

/// Event-management API client
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct CheckinClient {
    client: Client,
    api_url: String,
}

/// Status and JSON body of a response that arrived
struct RawResponse {
    status: StatusCode,
    payload: Option<Value>,
}

impl CheckinClient {
    /// Create a new client for the API rooted at `api_url`
    ///
    /// # Errors
    ///
    /// Returns `ApiError::RequestFailed` if the HTTP client cannot be built
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `POST /auth`
    pub async fn authenticate(&self, email: &str, password: &str) -> ApiReply<AuthSession> {
        let request = self
            .client
            .post(format!("{}/auth", self.api_url))
            .json(&json!({ "email": email, "password": password }));

        match self.execute("auth", request).await {
            Ok(response) => {
                let result = Self::check_status(&response)
                    .and_then(|()| envelope::auth_session(response.payload.as_ref()));
                ApiReply::new(response.payload, result)
            },
            Err(error) => ApiReply::failed(error),
        }
    }

    /// `GET /checkin/event-list?event_id=`
    pub async fn list_events(&self, token: &str, selected: Option<&Id>) -> ApiReply<Vec<EventSummary>> {
        let request = self
            .client
            .get(format!("{}/checkin/event-list", self.api_url))
            .query(&[("event_id", selected.map_or("", Id::as_str))])
            .bearer_auth(token);

        match self.execute("event-list", request).await {
            Ok(response) => {
                let result = Self::check_status(&response).map(|()| {
                    envelope::list(response.payload.as_ref(), envelope::EVENT_LIST_SHAPES)
                });
                ApiReply::new(response.payload, result)
            },
            Err(error) => ApiReply::failed(error),
        }
    }

    /// `GET /checkin/validation?event=&registration=&event_id=`
    pub async fn validate_registration(
        &self,
        token: &str,
        event: &Id,
        code: &str,
    ) -> ApiReply<RegistrationResource> {
        let event = urlencoding::encode(event.as_str());
        let url = format!(
            "{}/checkin/validation?event={event}&registration={}&event_id={event}",
            self.api_url,
            urlencoding::encode(code),
        );
        let request = self.client.get(url).bearer_auth(token);

        match self.execute("validation", request).await {
            Ok(response) => {
                let result = Self::check_status(&response)
                    .and_then(|()| envelope::registration(response.payload.as_ref()));
                ApiReply::new(response.payload, result)
            },
            Err(error) => ApiReply::failed(error),
        }
    }

    /// `POST /checkin/search/`
    pub async fn search_registrations(
        &self,
        token: &str,
        search: &SearchRequest,
    ) -> ApiReply<Vec<RegistrationResource>> {
        let request = self
            .client
            .post(format!("{}/checkin/search/", self.api_url))
            .bearer_auth(token)
            .json(search);

        match self.execute("search", request).await {
            Ok(response) => {
                let result = Self::check_status(&response).map(|()| {
                    envelope::list(response.payload.as_ref(), envelope::SEARCH_SHAPES)
                });
                ApiReply::new(response.payload, result)
            },
            Err(error) => ApiReply::failed(error),
        }
    }

    /// `POST /checkin/confirm`
    pub async fn confirm_check_in(&self, token: &str, confirm: &ConfirmRequest) -> ApiReply<()> {
        let request = self
            .client
            .post(format!("{}/checkin/confirm", self.api_url))
            .bearer_auth(token)
            .json(confirm);

        match self.execute("confirm", request).await {
            Ok(response) => {
                let result = Self::check_status(&response);
                ApiReply::new(response.payload, result)
            },
            Err(error) => ApiReply::failed(error),
        }
    }

    /// Send a request and read its body as JSON when possible
    async fn execute(&self, endpoint: &'static str, request: RequestBuilder) -> Result<RawResponse, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!(endpoint, error = %e, "Request failed");
            ApiError::RequestFailed(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))?;
        let payload = serde_json::from_slice::<Value>(&body).ok();

        tracing::debug!(endpoint, status = status.as_u16(), json = payload.is_some(), "Response received");
        Ok(RawResponse { status, payload })
    }

    /// Map a non-2xx status to its error
    fn check_status(response: &RawResponse) -> Result<(), ApiError> {
        match response.status {
            status if status.is_success() => Ok(()),
            StatusCode::FORBIDDEN => Err(ApiError::Unauthorized {
                message: envelope::error_message(response.payload.as_ref()),
            }),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound {
                message: envelope::error_message(response.payload.as_ref()),
            }),
            status => Err(ApiError::Rejected {
                status: status.as_u16(),
                message: envelope::error_message(response.payload.as_ref()),
            }),
        }
    }
}
