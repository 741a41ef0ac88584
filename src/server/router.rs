use crate::http::request::Request;
use crate::http::response::Response;
use crate::proxy::ProxyHandler;
use crate::proxy::forward::{ALLOW_HEADER, PROXY_METHODS, api_segments};

/// Sends `/api/<segments...>` to the proxy and answers everything else.
#[derive(Debug, Clone)]
pub struct Router {
    proxy: ProxyHandler,
}

impl Router {
    pub fn new(proxy: ProxyHandler) -> Self {
        Self { proxy }
    }

    pub async fn dispatch(&self, request: &Request) -> Response {
        let Some(segments) = api_segments(request.path_only()) else {
            tracing::debug!(path = %request.path, "No route");
            return Response::not_found();
        };

        if !PROXY_METHODS.contains(&request.method) {
            return Response::method_not_allowed(ALLOW_HEADER);
        }

        self.proxy.handle(request, segments).await
    }
}
