//! Response envelope normalization
//!
//! The API wraps the same data in different envelopes depending on the
//! endpoint and server version. Each endpoint has an ordered list of
//! accepted shapes; a shape is a path of object keys, and the empty path is
//! the raw payload itself.
//!
//! - Lists: the first shape that resolves to a non-empty array wins. When
//!   none does the list is empty. Items that fail to decode are skipped.
//! - Objects: the first shape that resolves to a non-null value wins.

use crate::error::ApiError;
use crate::types::{AuthSession, RegistrationResource};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Path of object keys leading to a candidate value
pub type Shape = &'static [&'static str];

/// Accepted shapes for the login token
pub const TOKEN_SHAPES: &[Shape] = &[&["token"], &["access_token"], &["data", "token"]];

/// Accepted shapes for the login user
pub const USER_SHAPES: &[Shape] = &[&["user"], &["data", "user"]];

/// Accepted shapes for the event list
pub const EVENT_LIST_SHAPES: &[Shape] = &[&["data"], &["events"], &[]];

/// Accepted shapes for a validated registration (before unwrapping `registration`)
pub const REGISTRATION_SHAPES: &[Shape] = &[&["data"], &[]];

/// Accepted shapes for search results
pub const SEARCH_SHAPES: &[Shape] = &[&["registrations"], &["data"], &["results"], &[]];

/// Resolve a shape against a payload
#[must_use]
pub fn lookup<'a>(payload: &'a Value, shape: Shape) -> Option<&'a Value> {
    shape.iter().try_fold(payload, |value, key| value.get(key))
}

/// First shape resolving to a non-null value
#[must_use]
pub fn first_present<'a>(payload: &'a Value, shapes: &[Shape]) -> Option<&'a Value> {
    shapes
        .iter()
        .filter_map(|shape| lookup(payload, *shape))
        .find(|value| !value.is_null())
}

/// First shape resolving to a non-empty array, decoded item by item
#[must_use]
pub fn list<T: DeserializeOwned>(payload: Option<&Value>, shapes: &[Shape]) -> Vec<T> {
    let Some(payload) = payload else {
        return Vec::new();
    };
    let Some(items) = shapes
        .iter()
        .filter_map(|shape| lookup(payload, *shape))
        .filter_map(Value::as_array)
        .find(|items| !items.is_empty())
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                tracing::debug!(%error, "Skipping list item that failed to decode");
                None
            },
        })
        .collect()
}

/// Extract token and user from a login payload
///
/// # Errors
///
/// Returns [`ApiError::MissingCredentials`] when either part is absent.
pub fn auth_session(payload: Option<&Value>) -> Result<AuthSession, ApiError> {
    let payload = payload.ok_or(ApiError::MissingCredentials)?;

    let token = TOKEN_SHAPES
        .iter()
        .filter_map(|shape| lookup(payload, *shape))
        .filter_map(Value::as_str)
        .find(|token| !token.is_empty())
        .ok_or(ApiError::MissingCredentials)?;

    let user = first_present(payload, USER_SHAPES)
        .filter(|user| user.is_object())
        .ok_or(ApiError::MissingCredentials)?;

    Ok(AuthSession {
        token: token.to_string(),
        user: user.clone(),
    })
}

/// Extract the registration from a validation payload
///
/// A payload without a registration is reported as [`ApiError::NotFound`].
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] for an empty payload and
/// [`ApiError::ResponseParseFailed`] when the registration does not decode.
pub fn registration(payload: Option<&Value>) -> Result<RegistrationResource, ApiError> {
    let data = payload
        .and_then(|payload| first_present(payload, REGISTRATION_SHAPES))
        .ok_or(ApiError::NotFound { message: None })?;

    let record = data
        .get("registration")
        .filter(|inner| !inner.is_null())
        .unwrap_or(data);

    serde_json::from_value(record.clone())
        .map_err(|error| ApiError::ResponseParseFailed(error.to_string()))
}

/// Human message carried by an error body: `message`, else `error`
#[must_use]
pub fn error_message(payload: Option<&Value>) -> Option<String> {
    let payload = payload?;
    ["message", "error"]
        .into_iter()
        .filter_map(|key| payload.get(key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|message| !message.is_empty())
        .map(str::to_string)
}
