//! Error types for the check-in API client

use thiserror::Error;

/// Errors that can occur when talking to the event-management API
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server rejected the bearer token (HTTP 403)
    #[error("Unauthorized (status 403)")]
    Unauthorized {
        /// `message` or `error` field of the response body, if any
        message: Option<String>,
    },

    /// The requested record does not exist (HTTP 404), or the server
    /// answered successfully without one
    #[error("Not found")]
    NotFound {
        /// `message` or `error` field of the response body, if any
        message: Option<String>,
    },

    /// Any other non-2xx response
    #[error("API error (status {status}): {}", message.as_deref().unwrap_or("no message"))]
    Rejected {
        /// HTTP status code
        status: u16,
        /// `message` or `error` field of the response body, if any
        message: Option<String>,
    },

    /// Login succeeded but the reply lacked a token or a user
    #[error("Login response is missing the user or the token")]
    MissingCredentials,

    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),
}

impl ApiError {
    /// HTTP status code behind this error, if the server answered
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Rejected { status, .. } => Some(*status),
            Self::MissingCredentials | Self::RequestFailed(_) | Self::ResponseParseFailed(_) => {
                None
            },
        }
    }

    /// Whether the session must be torn down
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Message the server put in the error body
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message }
            | Self::NotFound { message }
            | Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether no usable response reached the client
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::RequestFailed(_) | Self::ResponseParseFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized { message: None }.status(), Some(403));
        assert_eq!(ApiError::NotFound { message: None }.status(), Some(404));
        assert_eq!(
            ApiError::Rejected { status: 500, message: None }.status(),
            Some(500)
        );
        assert_eq!(ApiError::RequestFailed("refused".into()).status(), None);
    }

    #[test]
    fn test_display_uses_body_message() {
        let error = ApiError::Rejected {
            status: 422,
            message: Some("Valor inválido".into()),
        };
        assert_eq!(error.to_string(), "API error (status 422): Valor inválido");
        assert!(!error.is_transport());
        assert!(ApiError::ResponseParseFailed("eof".into()).is_transport());
    }

    #[test]
    fn test_message_kept_on_403_and_404() {
        let expired = ApiError::Unauthorized {
            message: Some("Credenciais inválidas".into()),
        };
        assert_eq!(expired.message(), Some("Credenciais inválidas"));
        assert!(expired.is_unauthorized());
        assert_eq!(ApiError::NotFound { message: None }.message(), None);
        assert_eq!(ApiError::RequestFailed("refused".into()).message(), None);
    }
}
