//! Forwarding to the upstream renderer.
//!
//! # Responsibilities
//! - Point the request at the renderer, optionally at a rewritten path
//! - Add X-Forwarded-* headers
//! - Stream the renderer's response back
//!
//! # Design Decisions
//! - Bodies are streamed, never buffered
//! - No retries; a connection failure surfaces as 502 to the caller

use std::net::SocketAddr;
use std::str::FromStr;

use axum::{
    body::Body,
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        HeaderMap, HeaderValue, Request, Response, Uri,
    },
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::routing::RequestAttrs;

/// Errors raised while forwarding a request.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid rewrite target: {0}")]
    Target(#[from] axum::http::uri::InvalidUri),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// HTTP client bound to the renderer address.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

impl Upstream {
    pub fn new(address: &str) -> Result<Self, axum::http::uri::InvalidUri> {
        let authority = Authority::from_str(address)?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { client, authority })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Build the upstream URI, replacing path and query with `target` if given.
    pub fn upstream_uri(&self, original: &Uri, target: Option<&str>) -> Result<Uri, ForwardError> {
        let path_and_query = match target {
            Some(target) => PathAndQuery::from_str(target)?,
            None => original
                .path_and_query()
                .cloned()
                .unwrap_or_else(|| PathAndQuery::from_static("/")),
        };
        Ok(Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?)
    }

    /// Forward `request` to the renderer.
    pub async fn send(
        &self,
        request: Request<Body>,
        target: Option<&str>,
        attrs: &RequestAttrs,
        peer: SocketAddr,
    ) -> Result<Response<Body>, ForwardError> {
        let (mut parts, body) = request.into_parts();
        parts.uri = self.upstream_uri(&parts.uri, target)?;
        add_forwarded_headers(&mut parts.headers, attrs, peer);

        let response: Response<Incoming> = self
            .client
            .request(Request::from_parts(parts, body))
            .await?;
        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

fn add_forwarded_headers(headers: &mut HeaderMap, attrs: &RequestAttrs, peer: SocketAddr) {
    let forwarded_for = match headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        Some(previous) => format!("{}, {}", previous, peer.ip()),
        None => peer.ip().to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
        headers.insert("x-forwarded-for", value);
    }
    if let Some(value) = attrs.host.as_deref().and_then(|h| HeaderValue::from_str(h).ok()) {
        headers.insert("x-forwarded-host", value);
    }
    if let Ok(value) = HeaderValue::from_str(&attrs.scheme) {
        headers.insert("x-forwarded-proto", value);
    }
}
