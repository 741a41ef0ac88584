use serde::Serialize;

use crate::http::headers::Headers;

/// An HTTP status code in the range 100..=599.
///
/// Proxied responses can carry any status the backend chose, so this is an
/// open newtype rather than a closed enum. The constants cover the codes the
/// server produces on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    /// 200 OK
    pub const OK: StatusCode = StatusCode(200);
    /// 201 Created
    pub const CREATED: StatusCode = StatusCode(201);
    /// 204 No Content
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    /// 304 Not Modified
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);
    /// 400 Bad Request
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    /// 401 Unauthorized
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    /// 404 Not Found
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    /// 405 Method Not Allowed
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    /// 413 Payload Too Large
    pub const PAYLOAD_TOO_LARGE: StatusCode = StatusCode(413);
    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Accepts any code from 100 to 599 inclusive.
    ///
    /// # Example
    ///
    /// ```
    /// # use fitgate::http::response::StatusCode;
    /// assert_eq!(StatusCode::from_u16(418).map(|s| s.as_u16()), Some(418));
    /// assert!(StatusCode::from_u16(600).is_none());
    /// ```
    pub fn from_u16(code: u16) -> Option<Self> {
        (100..=599).contains(&code).then_some(StatusCode(code))
    }

    /// Returns the numeric HTTP status code.
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn is_informational(&self) -> bool {
        self.0 < 200
    }

    /// False for 1xx, 204 and 304, which never carry a body or its framing.
    pub fn permits_body(&self) -> bool {
        !(self.is_informational() || *self == Self::NO_CONTENT || *self == Self::NOT_MODIFIED)
    }

    /// Returns the standard reason phrase, or an empty string for codes
    /// without a well-known one.
    ///
    /// # Example
    ///
    /// ```
    /// # use fitgate::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.canonical_reason(), "OK");
    /// assert_eq!(StatusCode::NOT_FOUND.canonical_reason(), "Not Found");
    /// ```
    pub fn canonical_reason(&self) -> &'static str {
        match self.0 {
            100 => "Continue",
            101 => "Switching Protocols",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            413 => "Payload Too Large",
            418 => "I'm a teapot",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "",
        }
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Reason phrase written on the status line
    pub reason: String,
    /// Header fields in output order
    pub headers: Headers,
    /// Response body as bytes
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::OK)
///     .header("Content-Type", "application/json")
///     .body(b"{}".to_vec())
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    reason: Option<String>,
    headers: Headers,
    body: Vec<u8>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Overrides the reason phrase. Defaults to the canonical one.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Adds a header without replacing earlier values of the same name.
    pub fn append_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the final Response.
    ///
    /// Adds a Content-Length header from the body size unless one is present.
    ///
    /// Statuses that cannot carry a body get neither a body nor the header.
    pub fn build(mut self) -> Response {
        if !self.status.permits_body() {
            self.body.clear();
            self.headers.remove("Content-Length");
        } else if !self.headers.contains("Content-Length") {
            self.headers
                .append("Content-Length", self.body.len().to_string());
        }

        Response {
            reason: self
                .reason
                .unwrap_or_else(|| self.status.canonical_reason().to_string()),
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

#[derive(Serialize)]
struct Failure<'a> {
    success: bool,
    message: &'a str,
}

impl Response {
    /// Serializes `value` as the JSON body of a response with `status`.
    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> anyhow::Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(ResponseBuilder::new(status)
            .header("Content-Type", "application/json")
            .body(body)
            .build())
    }

    /// The `{"success": false, "message": ...}` envelope the API speaks.
    pub fn failure(status: StatusCode, message: &str) -> Self {
        Self::json(
            status,
            &Failure {
                success: false,
                message,
            },
        )
        .unwrap_or_else(|_| ResponseBuilder::new(status).body(message).build())
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request() -> Self {
        Self::failure(StatusCode::BAD_REQUEST, "Bad request")
    }

    pub fn payload_too_large() -> Self {
        Self::failure(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::failure(StatusCode::NOT_FOUND, "Not found")
    }

    /// Creates a 405 Method Not Allowed response advertising `allow`.
    pub fn method_not_allowed(allow: &str) -> Self {
        let mut response = Self::failure(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
        response.headers.insert("Allow", allow);
        response
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        Self::failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}
