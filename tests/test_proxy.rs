//! Tests for the API proxy handler

mod common;

use fitgate::config::BodyReadPolicy;
use fitgate::http::request::{Method, Request, RequestBuilder};
use fitgate::http::response::StatusCode;
use fitgate::proxy::{BackendOrigin, ProxyHandler};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn handler(origin: &str) -> ProxyHandler {
    ProxyHandler::new(BackendOrigin::new(origin), BodyReadPolicy::BestEffort)
}

fn segments(request: &Request) -> Vec<String> {
    fitgate::proxy::forward::api_segments(request.path_only()).unwrap()
}

fn assert_internal_error(response: &fitgate::http::response::Response) {
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers.get("Content-Type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(
        body,
        json!({"success": false, "message": "Internal server error"})
    );
}

#[tokio::test]
async fn test_login_round_trip() {
    let backend = MockServer::start().await;
    let reply = r#"{"success":true,"user":{"id":1,"email":"a@b.com","name":"A","profile_complete":false}}"#;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "session=abc")
                .insert_header("X-Backend", "flask")
                .set_body_string(reply),
        )
        .expect(1)
        .mount(&backend)
        .await;

    let body = r#"{"email":"a@b.com","password":"x"}"#;
    let request = RequestBuilder::new()
        .method(Method::POST)
        .path("/api/login")
        .header("Content-Type", "application/json")
        .body(body)
        .build()
        .unwrap();

    let response = handler(&backend.uri())
        .handle(&request, segments(&request))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, reply.as_bytes());
    assert_eq!(response.headers.get("set-cookie"), Some("session=abc"));
    assert!(response.headers.get("X-Backend").is_none());
    assert!(response.headers.get("Content-Type").is_none());

    let received = backend.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let forwarded = &received[0];
    assert_eq!(forwarded.body, body.as_bytes());
    assert_eq!(
        forwarded.headers.get("content-type").unwrap().to_str().unwrap(),
        "application/json"
    );
    assert_eq!(forwarded.headers.get("cookie").unwrap().to_str().unwrap(), "");
}

#[tokio::test]
async fn test_cookie_and_query_are_forwarded() {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/progress-data"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success":true}"#))
        .mount(&backend)
        .await;

    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/api/progress-data?days=7&date=2024-05-01&days=30")
        .header("Cookie", "session=abc; theme=dark")
        .build()
        .unwrap();

    let response = handler(&backend.uri())
        .handle(&request, segments(&request))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let received = backend.received_requests().await.unwrap();
    let forwarded = &received[0];
    assert_eq!(forwarded.url.path(), "/api/progress-data");
    assert_eq!(forwarded.url.query(), Some("days=30&date=2024-05-01"));
    assert_eq!(
        forwarded.headers.get("cookie").unwrap().to_str().unwrap(),
        "session=abc; theme=dark"
    );
}

#[tokio::test]
async fn test_get_and_delete_never_carry_a_body() {
    let backend = MockServer::start().await;
    Mock::given(path("/api/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&backend)
        .await;

    for verb in [Method::GET, Method::DELETE] {
        let request = RequestBuilder::new()
            .method(verb)
            .path("/api/profile")
            .header("Content-Length", "11")
            .body("should drop")
            .build()
            .unwrap();

        handler(&backend.uri())
            .handle(&request, segments(&request))
            .await;
    }

    let received = backend.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].method.as_str(), "GET");
    assert_eq!(received[1].method.as_str(), "DELETE");
    for forwarded in &received {
        assert!(forwarded.body.is_empty());
        assert!(forwarded.headers.get("content-length").is_none());
    }
}

#[tokio::test]
async fn test_backend_errors_pass_through() {
    let backend = MockServer::start().await;
    let reply = r#"{"success":false,"message":"Not authenticated"}"#;
    Mock::given(method("PUT"))
        .and(path("/api/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_string(reply))
        .mount(&backend)
        .await;

    let request = RequestBuilder::new()
        .method(Method::PUT)
        .path("/api/profile")
        .body("{}")
        .build()
        .unwrap();

    let response = handler(&backend.uri())
        .handle(&request, segments(&request))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.reason, "Unauthorized");
    assert_eq!(response.body, reply.as_bytes());
}

#[tokio::test]
async fn test_custom_reason_and_cookie_casing_are_relayed() {
    let (origin, backend) = common::stub_backend(
        b"HTTP/1.1 418 Short and Stout\r\nSET-COOKIE: session=abc; HttpOnly\r\nset-cookie: theme=dark\r\nX-Other: no\r\nContent-Length: 6\r\n\r\nteapot",
    )
    .await;

    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/api/health")
        .build()
        .unwrap();

    let response = handler(&origin).handle(&request, segments(&request)).await;

    assert_eq!(response.status.as_u16(), 418);
    assert_eq!(response.reason, "Short and Stout");
    assert_eq!(response.body, b"teapot");
    let cookies: Vec<_> = response.headers.get_all("Set-Cookie").collect();
    assert_eq!(cookies, vec!["session=abc; HttpOnly", "theme=dark"]);
    assert!(response.headers.get("X-Other").is_none());

    let raw = String::from_utf8(backend.await.unwrap()).unwrap();
    assert!(raw.starts_with("GET /api/health HTTP/1.1\r\n"));
    assert!(raw.contains("Cookie: \r\n"));
    assert!(raw.contains("Connection: close\r\n"));
}

#[tokio::test]
async fn test_chunked_backend_body_is_reassembled() {
    let (origin, _backend) = common::stub_backend(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n7\r\n{\"succe\r\n9\r\nss\":true}\r\n0\r\n\r\n",
    )
    .await;

    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/api/dashboard-stats")
        .build()
        .unwrap();

    let response = handler(&origin).handle(&request, segments(&request)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, br#"{"success":true}"#);
    assert_eq!(response.headers.get("Content-Length"), Some("16"));
}

#[tokio::test]
async fn test_unreachable_backend_returns_generic_500() {
    let origin = common::dead_origin().await;

    let request = RequestBuilder::new()
        .method(Method::POST)
        .path("/api/login")
        .body("{}")
        .build()
        .unwrap();

    let response = handler(&origin).handle(&request, segments(&request)).await;

    assert_internal_error(&response);
}

#[tokio::test]
async fn test_malformed_origin_returns_generic_500() {
    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/api/health")
        .build()
        .unwrap();

    let response = handler("::not a url::")
        .handle(&request, segments(&request))
        .await;

    assert_internal_error(&response);
}

#[tokio::test]
async fn test_unreadable_body_policies() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&backend)
        .await;

    let request = RequestBuilder::new()
        .method(Method::POST)
        .path("/api/profile")
        .body(vec![0xc3, 0x28])
        .build()
        .unwrap();

    let lenient = ProxyHandler::new(BackendOrigin::new(backend.uri()), BodyReadPolicy::BestEffort)
        .handle(&request, segments(&request))
        .await;
    assert_eq!(lenient.status, StatusCode::OK);

    let strict = ProxyHandler::new(BackendOrigin::new(backend.uri()), BodyReadPolicy::Strict)
        .handle(&request, segments(&request))
        .await;
    assert_internal_error(&strict);

    // Only the lenient call reached the backend, with the bad byte replaced
    let received = backend.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].body, "\u{fffd}(".as_bytes());
}

#[tokio::test]
async fn test_latin1_body_is_forwarded_lossily() {
    let (origin, backend) =
        common::stub_backend(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}").await;

    let request = RequestBuilder::new()
        .method(Method::POST)
        .path("/api/register")
        .body(b"{\"name\":\"Jos\xe9\"}".to_vec())
        .build()
        .unwrap();

    let response = handler(&origin).handle(&request, segments(&request)).await;
    assert_eq!(response.status, StatusCode::OK);

    let raw = String::from_utf8(backend.await.unwrap()).unwrap();
    assert!(raw.ends_with("\r\n\r\n{\"name\":\"Jos\u{fffd}\"}"));
}

#[tokio::test]
async fn test_overflowing_chunk_size_returns_generic_500() {
    let (origin, _backend) = common::stub_backend(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nffffffffffffffff\r\nab\r\n",
    )
    .await;

    let request = RequestBuilder::new()
        .method(Method::GET)
        .path("/api/diet-plan")
        .build()
        .unwrap();

    let response = handler(&origin).handle(&request, segments(&request)).await;

    assert_internal_error(&response);
}

#[tokio::test]
async fn test_no_content_is_relayed_without_framing() {
    let (origin, _backend) = common::stub_backend(
        b"HTTP/1.1 204 No Content\r\nSet-Cookie: session=; Max-Age=0\r\n\r\n",
    )
    .await;

    let request = RequestBuilder::new()
        .method(Method::DELETE)
        .path("/api/profile")
        .build()
        .unwrap();

    let response = handler(&origin).handle(&request, segments(&request)).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());
    assert!(!response.headers.contains("Content-Length"));
    assert_eq!(
        response.headers.get("Set-Cookie"),
        Some("session=; Max-Age=0")
    );
}
