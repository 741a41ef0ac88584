//! Typed consumption of the backend API.
//!
//! - **`api`**: HTTP client with a session cookie jar
//! - **`schema`**: typed request/response records and envelope validation
//! - **`auth`**: the session context shared with the UI
//! - **`intake`**: profile questionnaire validation
//! - **`views`**: derived shapes for the dashboard panels

pub mod api;
pub mod auth;
pub mod intake;
pub mod schema;
pub mod views;

pub use api::{ApiClient, CookieJar};
pub use auth::{AuthContext, AuthSnapshot};
pub use schema::ApiError;
