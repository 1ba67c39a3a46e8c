//! Redirect responses.
//!
//! # Responsibilities
//! - Turn a redirect decision into a status + `Location` response
//! - Resolve origin-relative locations against the request origin
//!
//! # Design Decisions
//! - Non-redirect status codes fall back to 307
//! - A location that cannot be a header value is a 500, never a panic

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::routing::RequestAttrs;

/// Make `location` absolute when it is origin-relative and the origin is known.
pub fn absolute_location(request: &RequestAttrs, location: &str) -> String {
    let relative = location.starts_with('/') && !location.starts_with("//");
    match request.origin() {
        Some(origin) if relative => format!("{origin}{location}"),
        _ => location.to_string(),
    }
}

/// Build a redirect response.
pub fn redirect(request: &RequestAttrs, location: &str, status: u16) -> Response {
    let status = StatusCode::from_u16(status)
        .ok()
        .filter(StatusCode::is_redirection)
        .unwrap_or(StatusCode::TEMPORARY_REDIRECT);

    let location = absolute_location(request, location);
    match HeaderValue::from_str(&location) {
        Ok(value) => Response::builder()
            .status(status)
            .header(header::LOCATION, value)
            .body(Body::empty())
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
        Err(_) => {
            tracing::error!(location = %location, "Redirect location is not a valid header value");
            (StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect location").into_response()
        }
    }
}
