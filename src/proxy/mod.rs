//! Reverse proxy functionality
//!
//! Forwards `/api/*` calls to the backend origin: target URL construction,
//! request capture, the upstream HTTP client, and relaying the answer.

pub mod backend;
pub mod forward;
pub mod handler;
pub mod query;
pub mod upstream;

pub use backend::BackendOrigin;
pub use forward::{ForwardedRequest, ForwardedResponse};
pub use handler::ProxyHandler;
pub use query::QueryParams;
