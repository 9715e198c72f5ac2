//! Client identity resolution.
//!
//! The caller's address is taken, in strict priority order, from the
//! `Client-IP` header, the first `X-Forwarded-For` entry, and finally the
//! transport peer. The first candidate that parses as an IP address wins.
//! Resolution happens once per request; the result travels in the request
//! extensions to every later stage.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

use crate::http::error::ApiError;
use crate::http::request::RequestIdExt;

pub const CLIENT_IP: &str = "client-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// The validated caller address for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientIdentity(IpAddr);

impl ClientIdentity {
    pub fn new(addr: IpAddr) -> Self {
        Self(addr)
    }

    pub fn addr(&self) -> IpAddr {
        self.0
    }

    /// One-way hash of the address, safe to write to logs.
    pub fn pseudonym(&self) -> String {
        let digest = Sha256::digest(self.0.to_string().as_bytes());
        digest[..16].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}

/// Resolve the caller from headers and the transport peer.
pub fn resolve_client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
) -> Result<ClientIdentity, ApiError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let direct = header(CLIENT_IP).and_then(parse_ip);
    let forwarded = || {
        header(X_FORWARDED_FOR)
            .and_then(|list| list.split(',').next())
            .and_then(parse_ip)
    };

    direct
        .or_else(forwarded)
        .or_else(|| peer.map(|addr| addr.ip()))
        .map(ClientIdentity)
        .ok_or(ApiError::IdentityUnresolved)
}

/// Middleware that resolves the identity and stores it in the request
/// extensions. Requests without a usable address stop here.
pub async fn identity_middleware(mut request: Request<Body>, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    match resolve_client_identity(request.headers(), peer) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                request_id = request.request_id().unwrap_or("-"),
                "Unable to resolve client identity"
            );
            e.into_response()
        }
    }
}
