//! Query strings embedded in the path as a delimited segment.
//!
//! The renderer caches generated pages by path only, so a query string is
//! carried as a final `~~~<encoded query>~~~` segment instead.

use percent_encoding::percent_decode_str;

use crate::routing::query::{encode_component, QueryParams};

/// Marker placed on both sides of an encoded query.
pub const MARKER: &str = "~~~";

/// Encode `query` into a single path segment.
pub fn encode(query: &QueryParams) -> String {
    format!("{MARKER}{}{MARKER}", encode_component(&query.to_query_string()))
}

/// Returns true if `segment` is a complete search token.
pub fn is_token(segment: &str) -> bool {
    segment.len() >= MARKER.len() * 2 && segment.starts_with(MARKER) && segment.ends_with(MARKER)
}

/// Decode a search token back into query parameters.
pub fn decode(segment: &str) -> Option<QueryParams> {
    if !is_token(segment) {
        return None;
    }
    let inner = &segment[MARKER.len()..segment.len() - MARKER.len()];
    let raw = percent_decode_str(inner).decode_utf8().ok()?;
    Some(QueryParams::parse(&raw))
}

/// Append the token for `query` as a new final segment of `path`.
///
/// Empty queries leave the path as-is. A trailing token that already
/// carries `query` is kept; a token carrying a different query is replaced.
pub fn append(path: &str, query: &QueryParams) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    if let Some(last) = last_segment(path).filter(|s| is_token(s)) {
        if decode(last).as_ref() == Some(query) {
            return path.to_string();
        }
        let head = &path[..path.len() - last.len()];
        return format!("{head}{}", encode(query));
    }
    let token = encode(query);
    if path.ends_with('/') {
        format!("{path}{token}")
    } else {
        format!("{path}/{token}")
    }
}

/// Split a trailing token off `path`.
pub fn split(path: &str) -> (String, Option<QueryParams>) {
    match path.rsplit_once('/') {
        Some((head, last)) if is_token(last) => {
            let head = if head.is_empty() { "/" } else { head };
            (head.to_string(), decode(last))
        }
        _ => (path.to_string(), None),
    }
}

fn last_segment(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|s| !s.is_empty())
}
