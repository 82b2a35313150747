//! Error types for the check-in flows.
//!
//! Controllers never surface raw transport errors. Every remote failure is
//! mapped at the request boundary into a [`CheckinError`] that carries the
//! message shown to staff for the operation that failed.

use checkin_api::ApiError;
use thiserror::Error;

/// Operation a remote failure happened in.
///
/// Selects the user-facing wording of the mapped error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `POST /auth`
    Login,
    /// `GET /checkin/event-list`
    ListEvents,
    /// `GET /checkin/validation`
    Validation,
    /// `POST /checkin/search/`
    Search,
    /// `POST /checkin/confirm`
    Confirm,
}

/// User-facing error taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckinError {
    // ═══════════════════════════════════════════════════════════
    // Local
    // ═══════════════════════════════════════════════════════════

    /// Input rejected before any request was made.
    #[error("{0}")]
    ValidationInput(String),

    // ═══════════════════════════════════════════════════════════
    // Remote
    // ═══════════════════════════════════════════════════════════

    /// The record does not exist (404, or an empty successful reply).
    #[error("{0}")]
    NotFound(String),

    /// The session is no longer accepted (403). Triggers teardown.
    #[error("{0}")]
    AuthExpired(String),

    /// No usable response: transport failure or undecodable body.
    #[error("{0}")]
    Network(String),

    /// Any other non-2xx response.
    #[error("{message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Message shown to staff
        message: String,
    },
}

impl CheckinError {
    /// Message shown when a 403 ends the session.
    pub const SESSION_EXPIRED: &'static str = "Session expired. Please sign in again.";

    /// Message shown for transport failures.
    pub const NETWORK: &'static str = "Network error. Please try again.";

    /// Session expired before any request was made.
    #[must_use]
    pub fn session_expired() -> Self {
        Self::AuthExpired(Self::SESSION_EXPIRED.to_string())
    }

    /// Map an API failure into the taxonomy with the wording for `operation`.
    ///
    /// 403 maps to `AuthExpired`, 404 to `NotFound`, transport and decoding
    /// failures to `Network`, every other status to `Server`.
    #[must_use]
    pub fn from_api(error: &ApiError, operation: Operation) -> Self {
        match error {
            ApiError::Unauthorized { message } => match operation {
                Operation::Login => {
                    Self::AuthExpired(server_message(message.as_deref(), operation, 403))
                },
                _ => Self::session_expired(),
            },
            ApiError::NotFound { message } => match operation {
                Operation::Validation => Self::NotFound("Invalid registration".to_string()),
                Operation::Confirm => Self::NotFound(CONFIRM_FAILED.to_string()),
                Operation::Login | Operation::ListEvents | Operation::Search => {
                    Self::NotFound(server_message(message.as_deref(), operation, 404))
                },
            },
            ApiError::Rejected { status, message } => Self::Server {
                status: *status,
                message: match operation {
                    Operation::Validation => "Unable to validate registration".to_string(),
                    Operation::Confirm => CONFIRM_FAILED.to_string(),
                    Operation::Login | Operation::ListEvents | Operation::Search => {
                        server_message(message.as_deref(), operation, *status)
                    },
                },
            },
            ApiError::MissingCredentials => {
                Self::Network("Unexpected login response. Missing user or token.".to_string())
            },
            ApiError::RequestFailed(_) | ApiError::ResponseParseFailed(_) => {
                Self::Network(Self::NETWORK.to_string())
            },
        }
    }

    /// Whether this error ends the session.
    #[must_use]
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired(_))
    }

    /// Whether the user can retry without losing entered input.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !self.is_auth_expired()
    }
}

const CONFIRM_FAILED: &str = "Unable to confirm check-in.";

/// Body message if the server sent one, else the generic wording
fn server_message(message: Option<&str>, operation: Operation, status: u16) -> String {
    message.map_or_else(|| status_message(operation, status), str::to_string)
}

fn status_message(operation: Operation, status: u16) -> String {
    match operation {
        Operation::Login => format!("Login failed ({status})"),
        Operation::ListEvents => format!("Unable to load events ({status})"),
        Operation::Search => format!("Search failed. ({status})"),
        Operation::Validation => "Unable to validate registration".to_string(),
        Operation::Confirm => CONFIRM_FAILED.to_string(),
    }
}

/// Errors from the credential storage backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("Storage I/O failed: {0}")]
    Io(String),

    /// A stored value could not be decoded.
    #[error("Stored value is corrupt: {0}")]
    Corrupt(String),

    /// The backend refused the operation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The API base URL is empty.
    #[error("CHECKIN_API_URL must not be empty")]
    EmptyApiUrl,

    /// The HTTP client could not be created.
    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),
}
