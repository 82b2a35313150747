//! # Checkin API Client
//!
//! Client library for the event-management API used by the check-in
//! companion: authentication, event listing, registration validation,
//! registration search and check-in confirmation.
//!
//! ## Example
//!
//! ```no_run
//! use checkin_api::{CheckinClient, SearchParameter, SearchRequest};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CheckinClient::new("http://localhost:8000/api/v1", Duration::from_secs(15))?;
//!
//!     let login = client.authenticate("staff@example.com", "secret").await;
//!     let session = login.result?;
//!
//!     let events = client.list_events(&session.token, None).await.result?;
//!     println!("{} events", events.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Replies
//!
//! Every call returns an [`ApiReply`]: the decoded outcome plus the raw JSON
//! payload (when the body was JSON). The payload is kept even for failed
//! requests, because the server may attach usage statistics to any response.

pub mod client;
pub mod envelope;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use client::CheckinClient;
pub use error::ApiError;
pub use types::{
    ApiReply, AthleteDetail, AuthSession, CategoryResource, ConfirmRequest, CourseResource,
    EventResource, EventSummary, Id, RegistrationExtra, RegistrationResource, SearchParameter,
    SearchRequest, TeamResource,
};
