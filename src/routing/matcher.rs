//! Path matching for the normalizer's scope.
//!
//! # Responsibilities
//! - Match request paths by raw prefix
//! - Combine matchers with OR semantics
//! - Decide whether a request is handed to the normalizer at all
//!
//! # Design Decisions
//! - Prefix matching is case-sensitive and not segment-aware: `/api`
//!   excludes `/apiary` too, as the renderer's own matcher does
//! - Empty scope = normalizer runs on every path
//! - No regex to guarantee O(n) matching

use crate::config::RoutingConfig;

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Combines multiple matchers with OR semantics.
#[derive(Debug, Default)]
pub struct AnyMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AnyMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AnyMatcher {
    fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }
}

/// Paths the normalizer skips; those requests are forwarded untouched.
#[derive(Debug, Default)]
pub struct RouteScope {
    excluded: AnyMatcher,
}

impl RouteScope {
    pub fn from_config(config: &RoutingConfig) -> Self {
        let matchers = config
            .excluded_prefixes
            .iter()
            .map(|p| Box::new(PathPrefixMatcher::new(p.clone())) as Box<dyn Matcher>)
            .collect();
        Self {
            excluded: AnyMatcher::new(matchers),
        }
    }

    /// Returns true if the normalizer should run for `path`.
    pub fn includes(&self, path: &str) -> bool {
        !self.excluded.matches(path)
    }
}
