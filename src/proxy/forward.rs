//! The transient request/response pair of one proxied call.

use anyhow::{Context, Result};

use crate::config::BodyReadPolicy;
use crate::http::headers::Headers;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::proxy::query::QueryParams;
use crate::proxy::upstream::UpstreamResponse;

/// Methods the API proxy accepts.
pub const PROXY_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// Value for the `Allow` header on 405 responses.
pub const ALLOW_HEADER: &str = "GET, POST, PUT, DELETE";

/// Splits an `/api/...` request path into its trailing segments.
///
/// Returns `None` for paths outside `/api/` and for `/api/` itself, which
/// has no segments to forward. Segments are returned exactly as received,
/// still percent-encoded, and may be empty (`/api/a/` gives `["a", ""]`).
pub fn api_segments(path: &str) -> Option<Vec<String>> {
    let rest = path.strip_prefix("/api/")?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.split('/').map(str::to_string).collect())
}

/// An inbound API call, reduced to what gets forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: QueryParams,
    /// Present only for POST/PUT.
    pub body: Option<String>,
    /// Inbound `Cookie` header, or empty.
    pub cookie: String,
}

impl ForwardedRequest {
    pub fn capture(request: &Request, segments: Vec<String>, policy: BodyReadPolicy) -> Result<Self> {
        if !PROXY_METHODS.contains(&request.method) {
            anyhow::bail!("Method {} is not proxied", request.method);
        }

        let body = if request.method.carries_body() {
            read_text_body(&request.body, policy)?
        } else {
            None
        };

        Ok(Self {
            method: request.method,
            segments,
            query: request.query().map(QueryParams::parse).unwrap_or_default(),
            body,
            cookie: request.header("Cookie").unwrap_or("").to_string(),
        })
    }

    /// Headers sent to the backend.
    pub fn upstream_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.append("Content-Type", "application/json");
        headers.append("Cookie", self.cookie.as_str());
        headers
    }
}

/// Decodes the body as UTF-8 text.
///
/// Invalid sequences become U+FFFD under `BestEffort`, the way a browser's
/// `Request::text()` reads them; `Strict` refuses the body instead.
fn read_text_body(raw: &[u8], policy: BodyReadPolicy) -> Result<Option<String>> {
    match std::str::from_utf8(raw) {
        Ok(text) => Ok(Some(text.to_string())),
        Err(e) => match policy {
            BodyReadPolicy::BestEffort => {
                tracing::debug!(error = %e, "Request body is not valid UTF-8, replacing bad bytes");
                Ok(Some(String::from_utf8_lossy(raw).into_owned()))
            }
            BodyReadPolicy::Strict => Err(e).context("Request body is not valid UTF-8 text"),
        },
    }
}

/// The backend's answer, reduced to what is relayed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedResponse {
    pub status: StatusCode,
    pub reason: String,
    pub body: Vec<u8>,
    /// Every `Set-Cookie` value, in backend order.
    pub set_cookies: Vec<String>,
}

impl From<UpstreamResponse> for ForwardedResponse {
    fn from(upstream: UpstreamResponse) -> Self {
        let set_cookies = upstream
            .headers
            .get_all("Set-Cookie")
            .map(str::to_string)
            .collect();

        Self {
            status: upstream.status,
            reason: upstream.reason,
            body: upstream.body,
            set_cookies,
        }
    }
}

impl ForwardedResponse {
    pub fn into_response(self) -> Response {
        let mut builder = ResponseBuilder::new(self.status)
            .reason(self.reason)
            .body(self.body);

        for cookie in self.set_cookies {
            builder = builder.append_header("Set-Cookie", cookie);
        }

        builder.build()
    }
}
