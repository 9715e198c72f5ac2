//! HTTPS enforcement.
//!
//! A request counts as secure when the listener terminates TLS itself or a
//! fronting proxy reports `X-Forwarded-Proto: https`. Anything else is
//! answered with a permanent redirect to the same host and URI over HTTPS.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;

pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

#[derive(Debug, Clone, Copy)]
pub struct HttpsPolicy {
    /// Redirect insecure requests.
    pub enforce: bool,
    /// The listener itself serves TLS.
    pub tls_listener: bool,
}

impl HttpsPolicy {
    pub fn is_secure(&self, headers: &HeaderMap) -> bool {
        self.tls_listener
            || headers
                .get(X_FORWARDED_PROTO)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
    }
}

pub async fn https_redirect_middleware(
    State(policy): State<HttpsPolicy>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !policy.enforce || policy.is_secure(request.headers()) {
        return next.run(request).await;
    }

    let Some(host) = request.headers().get(header::HOST).and_then(|h| h.to_str().ok()) else {
        return ApiError::MissingHost.into_response();
    };
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = format!("https://{}{}", host, path_and_query);

    match HeaderValue::from_str(&location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => ApiError::MissingHost.into_response(),
    }
}
