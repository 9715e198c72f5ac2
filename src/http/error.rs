//! Errors that end a request before the lookup pipeline produces a result.
//!
//! Upstream failures never appear here: they are absorbed by the geolocation
//! and detection components and show up as sentinels in the result.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No header or peer address yielded a valid IP address.
    #[error("Unable to determine client IP address")]
    IdentityUnresolved,

    /// The client exhausted its request budget for the current window.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { retry_after_secs: u64 },

    /// `format=jsonp` without a usable callback name.
    #[error("Invalid or missing callback parameter for JSONP")]
    InvalidCallback,

    /// A plain-HTTP request cannot be redirected without a Host header.
    #[error("Missing Host header")]
    MissingHost,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::IdentityUnresolved => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InvalidCallback => StatusCode::BAD_REQUEST,
            ApiError::MissingHost => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.to_string()).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
