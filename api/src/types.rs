//! Wire types for the check-in API

use crate::error::ApiError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deserialize `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifier sent by the server either as a string or as a number
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct Id(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for Id {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        }
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl Id {
    /// Create an id from its textual form
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Textual form of the id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credentials and identity returned by a successful login
#[derive(Clone, Debug, PartialEq)]
pub struct AuthSession {
    /// Bearer token for every other call
    pub token: String,
    /// Raw user object as sent by the server
    pub user: serde_json::Value,
}

/// Event as listed for selection
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventSummary {
    /// Event id
    pub id: Id,
    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Registration record driving the confirmation screen
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RegistrationResource {
    /// Registration id, sent back on confirmation
    pub id: Id,
    /// Registered athlete
    #[serde(default)]
    pub athlete: Option<AthleteDetail>,
    /// Event the registration belongs to
    #[serde(default)]
    pub event: Option<EventResource>,
    /// Course within the event
    #[serde(default)]
    pub course: Option<CourseResource>,
    /// Age/gender category
    #[serde(default)]
    pub category: Option<CategoryResource>,
    /// Team, if any
    #[serde(default)]
    pub team: Option<TeamResource>,
    /// Extra items attached to the registration (t-shirt, meal, ...)
    #[serde(default, deserialize_with = "null_as_default")]
    pub extras: Vec<RegistrationExtra>,
    /// Registration status label
    #[serde(default)]
    pub status: Option<String>,
    /// Whether the athlete already checked in
    #[serde(default, deserialize_with = "null_as_default")]
    pub check_in: bool,
    /// Bib number, once assigned
    #[serde(default)]
    pub bib_number: Option<i64>,
    /// Whether the server allows checking this registration in
    #[serde(default, deserialize_with = "null_as_default")]
    pub allow_check_in: bool,
    /// Registration date
    #[serde(default)]
    pub registered_on: Option<String>,
    /// Registration timestamp
    #[serde(default)]
    pub registered_at: Option<String>,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl RegistrationResource {
    /// Registration with only an id; every other field empty
    #[must_use]
    pub fn new(id: Id) -> Self {
        Self {
            id,
            athlete: None,
            event: None,
            course: None,
            category: None,
            team: None,
            extras: Vec::new(),
            status: None,
            check_in: false,
            bib_number: None,
            allow_check_in: false,
            registered_on: None,
            registered_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Name shown for the athlete of this registration
    #[must_use]
    pub fn athlete_name(&self) -> String {
        self.athlete
            .as_ref()
            .map_or_else(|| AthleteDetail::FALLBACK_NAME.to_string(), AthleteDetail::display_name)
    }
}

/// Athlete attached to a registration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AthleteDetail {
    /// Athlete id
    #[serde(default)]
    pub id: Option<Id>,
    /// Full name
    #[serde(default)]
    pub name: Option<String>,
    /// Given name
    #[serde(default)]
    pub firstname: Option<String>,
    /// Family name
    #[serde(default)]
    pub lastname: Option<String>,
    /// National identification number
    #[serde(default)]
    pub identification_number: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub avatar: Option<String>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Gender label
    #[serde(default)]
    pub gender: Option<String>,
    /// Birth date
    #[serde(default)]
    pub birth_date: Option<String>,
}

impl AthleteDetail {
    /// Label used when the athlete has no usable name
    pub const FALLBACK_NAME: &'static str = "Athlete";

    /// `name`, else first and last name joined, else "Athlete"
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let joined = [self.firstname.as_deref(), self.lastname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() {
            Self::FALLBACK_NAME.to_string()
        } else {
            joined
        }
    }
}

/// Event details embedded in a registration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventResource {
    /// Event id
    #[serde(default)]
    pub id: Option<Id>,
    /// Event name
    #[serde(default)]
    pub name: Option<String>,
    /// Venue
    #[serde(default)]
    pub location: Option<String>,
    /// First day of the event
    #[serde(default)]
    pub start_date: Option<String>,
}

/// Course of a registration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseResource {
    /// Course id
    #[serde(default)]
    pub id: Option<Id>,
    /// Course name
    #[serde(default)]
    pub name: Option<String>,
    /// Distance label
    #[serde(default)]
    pub distance: Option<String>,
}

/// Category of a registration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryResource {
    /// Category id
    #[serde(default)]
    pub id: Option<Id>,
    /// Category name
    #[serde(default)]
    pub name: Option<String>,
    /// Short code
    #[serde(default)]
    pub code: Option<String>,
}

/// Team of a registration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamResource {
    /// Team name
    #[serde(default)]
    pub name: Option<String>,
}

/// Extra item attached to a registration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrationExtra {
    /// Extra id
    #[serde(default)]
    pub id: Option<Id>,
    /// Value chosen by the athlete
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    /// Kind of extra
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    /// Delivery status
    #[serde(default)]
    pub status: Option<String>,
}

/// Field a registration search matches against
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SearchParameter {
    /// Bib number
    #[default]
    BibNumber,
    /// National identification number
    IdentificationNumber,
    /// Registration code
    Code,
}

impl SearchParameter {
    /// Every parameter, in display order
    pub const ALL: [Self; 3] = [Self::BibNumber, Self::IdentificationNumber, Self::Code];

    /// Wire name of the parameter
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BibNumber => "bib_number",
            Self::IdentificationNumber => "identification_number",
            Self::Code => "code",
        }
    }

    /// Human label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BibNumber => "Bib number",
            Self::IdentificationNumber => "ID number",
            Self::Code => "Code",
        }
    }
}

impl fmt::Display for SearchParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchParameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|parameter| parameter.as_str() == s)
            .ok_or_else(|| format!("unknown search parameter: {s}"))
    }
}

/// Body of `POST /checkin/search/`
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct SearchRequest {
    /// Trimmed query
    pub value: String,
    /// Field to match
    pub parameter: SearchParameter,
    /// Event scope
    pub event: Id,
}

/// Body of `POST /checkin/confirm`
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ConfirmRequest {
    /// Registration being checked in
    pub registration: Id,
    /// Event scope
    pub event_id: Id,
}

/// Outcome of an API call plus the JSON body it carried
///
/// The body is kept for failed calls as well; callers inspect it for
/// usage statistics regardless of the outcome.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiReply<T> {
    /// Parsed JSON body, `None` when the body was empty or not JSON
    pub payload: Option<serde_json::Value>,
    /// Decoded outcome
    pub result: Result<T, ApiError>,
}

impl<T> ApiReply<T> {
    /// Create a reply from a payload and an outcome
    #[must_use]
    pub const fn new(payload: Option<serde_json::Value>, result: Result<T, ApiError>) -> Self {
        Self { payload, result }
    }

    /// Reply for a call that produced no response body
    #[must_use]
    pub const fn failed(error: ApiError) -> Self {
        Self {
            payload: None,
            result: Err(error),
        }
    }

    /// Transform the successful outcome
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiReply<U> {
        ApiReply {
            payload: self.payload,
            result: self.result.map(f),
        }
    }
}
