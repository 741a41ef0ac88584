//! fitgate - API gateway for the fitness web app
//!
//! Forwards the browser's `/api/*` calls to the backend service, keeping the
//! session cookie flowing both ways, and provides a typed client for the
//! backend's JSON API.

pub mod client;
pub mod config;
pub mod http;
pub mod proxy;
pub mod server;
