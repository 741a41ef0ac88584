//! Upstream connection and request forwarding
//!
//! A minimal HTTP/1.1 client: one TCP connection per request, sent with
//! `Connection: close`. It backs both the API proxy and the typed API client.

use anyhow::{Context, Result};
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use url::Url;

use crate::http::chunked::decode_chunked;
use crate::http::headers::Headers;
use crate::http::request::Method;
use crate::http::response::StatusCode;

/// Default buffer size for reads
const BUFFER_SIZE: usize = 8192;

/// Largest response head accepted from a backend.
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Headers that describe a single hop and are never copied onward.
const HOP_BY_HOP: &[&str] = &[
    "Connection",
    "Keep-Alive",
    "Proxy-Connection",
    "Transfer-Encoding",
    "Upgrade",
    "TE",
    "Trailer",
];

/// A request about to be sent to a backend.
#[derive(Debug)]
pub struct UpstreamRequest<'a> {
    pub method: Method,
    pub url: &'a Url,
    pub headers: Headers,
    /// `None` sends no body at all; `Some(b"")` sends `Content-Length: 0`.
    pub body: Option<&'a [u8]>,
}

/// What a backend answered.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Reason phrase exactly as the backend wrote it.
    pub reason: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

/// Sends `request` and reads the full response.
pub async fn send(request: &UpstreamRequest<'_>) -> Result<UpstreamResponse> {
    let url = request.url;
    if url.scheme() != "http" {
        anyhow::bail!("Unsupported backend scheme {:?}", url.scheme());
    }

    let host = url.host_str().context("Backend URL missing host")?;
    let port = url.port_or_known_default().unwrap_or(80);
    let addr = format!("{}:{}", host, port);

    let mut stream = TcpStream::connect(&addr)
        .await
        .with_context(|| format!("Failed to connect to backend at {}", addr))?;

    tracing::trace!(%addr, "Connected to backend");

    let request_bytes = build_http_request(request)?;
    stream
        .write_all(&request_bytes)
        .await
        .context("Failed to write request to backend")?;
    stream.flush().await?;

    tracing::trace!(bytes = request_bytes.len(), "Request sent to backend");

    read_http_response(&mut stream).await
}

/// Builds HTTP request bytes to send to the backend
pub fn build_http_request(request: &UpstreamRequest<'_>) -> Result<Vec<u8>> {
    let url = request.url;
    let mut buffer = Vec::new();

    let target = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };

    buffer.extend_from_slice(format!("{} {} HTTP/1.1\r\n", request.method, target).as_bytes());

    let mut headers = request.headers.clone();

    // Host always names the backend
    let host = url.host_str().context("Backend URL missing host")?;
    let host_value = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    headers.insert("Host", host_value);

    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove("Content-Length");

    headers.insert("Connection", "close");
    if let Some(body) = request.body {
        headers.insert("Content-Length", body.len().to_string());
    }

    for (key, value) in headers.iter() {
        buffer.extend_from_slice(format!("{}: {}\r\n", key, value).as_bytes());
    }

    // End of headers
    buffer.extend_from_slice(b"\r\n");

    if let Some(body) = request.body {
        buffer.extend_from_slice(body);
    }

    Ok(buffer)
}

/// Reads an HTTP response from the backend
pub async fn read_http_response<S>(stream: &mut S) -> Result<UpstreamResponse>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    loop {
        if let Some(headers_end) = buffer.windows(4).position(|window| window == b"\r\n\r\n") {
            let head = buffer.split_to(headers_end + 4);
            let (status, reason, headers) = parse_response_head(&head)?;

            // 1xx responses are interim; the final one follows on the same stream
            if status.is_informational() {
                tracing::trace!(status = status.as_u16(), "Skipping interim response");
                continue;
            }

            let body = read_response_body(stream, &mut buffer, status, &headers).await?;

            return Ok(UpstreamResponse {
                status,
                reason,
                headers,
                body,
            });
        }

        if buffer.len() > MAX_HEAD_BYTES {
            anyhow::bail!("Response headers too large");
        }

        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            anyhow::bail!("Connection closed before complete response received");
        }
    }
}

/// Parses the status line and header fields of a response head.
pub fn parse_response_head(head: &[u8]) -> Result<(StatusCode, String, Headers)> {
    let head = std::str::from_utf8(head).context("Invalid UTF-8 in response headers")?;

    let mut lines = head.split("\r\n");

    let status_line = lines.next().context("Empty response")?;
    let mut parts = status_line.splitn(3, ' ');

    let version = parts.next().unwrap_or("");
    if !version.starts_with("HTTP/") {
        anyhow::bail!("Invalid status line: {}", status_line);
    }

    let code: u16 = parts
        .next()
        .context("Status line missing code")?
        .parse()
        .context("Invalid status code")?;
    let status = StatusCode::from_u16(code)
        .with_context(|| format!("Status code {} out of range", code))?;
    let reason = parts.next().unwrap_or("").to_string();

    let mut headers = Headers::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            headers.append(key.trim(), value.trim());
        }
    }

    Ok((status, reason, headers))
}

async fn read_response_body<S>(
    stream: &mut S,
    buffer: &mut BytesMut,
    status: StatusCode,
    headers: &Headers,
) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    if !status.permits_body() {
        return Ok(Vec::new());
    }

    let chunked = headers
        .get("Transfer-Encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));

    if chunked {
        loop {
            match decode_chunked(buffer) {
                Ok(Some((body, _))) => return Ok(body),
                Ok(None) => {}
                Err(e) => anyhow::bail!("Malformed chunked response body: {:?}", e),
            }

            if stream.read_buf(buffer).await? == 0 {
                anyhow::bail!("Connection closed inside chunked body");
            }
        }
    }

    if let Some(raw) = headers.get("Content-Length") {
        let content_length: usize = raw
            .parse()
            .with_context(|| format!("Invalid Content-Length {:?}", raw))?;

        while buffer.len() < content_length {
            if stream.read_buf(buffer).await? == 0 {
                anyhow::bail!("Connection closed before complete body received");
            }
        }

        return Ok(buffer.split_to(content_length).to_vec());
    }

    // No framing: the body runs until the backend closes
    while stream.read_buf(buffer).await? != 0 {}
    Ok(buffer.split().to_vec())
}
