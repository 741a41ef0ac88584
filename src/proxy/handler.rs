//! The `/api/*` reverse proxy endpoint.

use anyhow::Result;

use crate::config::{BodyReadPolicy, Config};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::proxy::backend::BackendOrigin;
use crate::proxy::forward::{ForwardedRequest, ForwardedResponse};
use crate::proxy::upstream::{self, UpstreamRequest};

/// Forwards API calls to the backend origin.
///
/// Holds no mutable state; one instance is shared by every connection.
#[derive(Debug, Clone)]
pub struct ProxyHandler {
    origin: BackendOrigin,
    body_policy: BodyReadPolicy,
}

impl ProxyHandler {
    pub fn new(origin: BackendOrigin, body_policy: BodyReadPolicy) -> Self {
        Self {
            origin,
            body_policy,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            BackendOrigin::new(config.backend.url.clone()),
            config.proxy.body_read,
        )
    }

    pub fn origin(&self) -> &BackendOrigin {
        &self.origin
    }

    /// Proxies `request`, whose `/api/` path split into `segments`.
    ///
    /// Never fails: any error while forwarding becomes the generic 500.
    pub async fn handle(&self, request: &Request, segments: Vec<String>) -> Response {
        match self.forward(request, segments).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    error = ?e,
                    method = %request.method,
                    path = %request.path_only(),
                    "API proxy error"
                );
                Response::internal_error()
            }
        }
    }

    /// One pass of the forwarding flow; errors propagate to [`Self::handle`].
    pub async fn forward(&self, request: &Request, segments: Vec<String>) -> Result<Response> {
        let forwarded = ForwardedRequest::capture(request, segments, self.body_policy)?;
        let url = self.origin.target_url(&forwarded.segments, &forwarded.query)?;

        tracing::debug!(
            method = %forwarded.method,
            target = %url,
            has_body = forwarded.body.is_some(),
            "Forwarding request to backend"
        );

        let upstream_request = UpstreamRequest {
            method: forwarded.method,
            url: &url,
            headers: forwarded.upstream_headers(),
            body: forwarded.body.as_deref().map(str::as_bytes),
        };
        let upstream_response = upstream::send(&upstream_request).await?;

        tracing::info!(
            method = %forwarded.method,
            path = %url.path(),
            status = upstream_response.status.as_u16(),
            "Request forwarded"
        );

        Ok(ForwardedResponse::from(upstream_response).into_response())
    }
}
