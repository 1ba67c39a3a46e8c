//! Per-request routing decision.
//!
//! # Responsibilities
//! - Capture the routing-relevant parts of a request (path, query, origin)
//! - Run the ordered rule table and return exactly one action
//!
//! # Design Decisions
//! - Pure: no I/O, no shared mutable state
//! - First rule that produces an action wins
//! - No rule matched = pass through unmodified

use std::sync::Arc;

use axum::http::{header, HeaderMap, Uri};
use serde::Serialize;

use crate::config::RoutingConfig;
use crate::i18n::LocaleSet;
use crate::routing::query::QueryParams;
use crate::routing::rules::{self, Outcome, Rule, RuleContext};

/// Rule name reported when no rule fired.
pub const PASS_THROUGH: &str = "pass-through";

/// The routing-relevant attributes of one inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAttrs {
    pub path: String,
    pub query: QueryParams,
    pub host: Option<String>,
    pub scheme: String,
}

impl RequestAttrs {
    /// Attributes for `path` and a raw query string, with no known host.
    pub fn new(path: impl Into<String>, query: &str) -> Self {
        Self {
            path: path.into(),
            query: QueryParams::parse(query),
            host: None,
            scheme: "http".to_string(),
        }
    }

    /// Extract attributes from an HTTP request head.
    ///
    /// The scheme honours `X-Forwarded-Proto` when a TLS terminator sits in
    /// front of the edge.
    pub fn from_http(uri: &Uri, headers: &HeaderMap) -> Self {
        let host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| uri.authority().map(|a| a.to_string()));

        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| uri.scheme_str().map(str::to_string))
            .unwrap_or_else(|| "http".to_string());

        Self {
            path: uri.path().to_string(),
            query: QueryParams::parse(uri.query().unwrap_or("")),
            host,
            scheme,
        }
    }

    /// Parse an absolute URL.
    pub fn parse_url(raw: &str) -> Result<Self, url::ParseError> {
        let url = url::Url::parse(raw)?;
        let host = url.host_str().map(|h| match url.port() {
            Some(port) => format!("{h}:{port}"),
            None => h.to_string(),
        });
        Ok(Self {
            path: url.path().to_string(),
            query: QueryParams::parse(url.query().unwrap_or("")),
            host,
            scheme: url.scheme().to_string(),
        })
    }

    /// `scheme://host` when the host is known.
    pub fn origin(&self) -> Option<String> {
        self.host
            .as_ref()
            .map(|host| format!("{}://{}", self.scheme, host))
    }
}

/// What the HTTP layer should do with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingAction {
    /// Answer with a redirect to an origin-relative location.
    Redirect { location: String, status: u16 },
    /// Serve the request from a different origin-relative path.
    Rewrite { target: String },
    /// Serve the request as it arrived.
    PassThrough,
}

/// A routing action together with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub rule: &'static str,
    pub action: RoutingAction,
}

/// Settings shared by all rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSettings {
    pub preview_endpoint: String,
    pub preview_exit_endpoint: String,
    pub dynamic_redirect_endpoint: String,
    pub redirect_status: u16,
    pub embed_query_in_path: bool,
}

impl RuleSettings {
    pub fn from_config(config: &RoutingConfig) -> Self {
        Self {
            preview_endpoint: config.preview_endpoint.clone(),
            preview_exit_endpoint: config.preview_exit_endpoint.clone(),
            dynamic_redirect_endpoint: config.dynamic_redirect_endpoint.clone(),
            redirect_status: config.redirect_status,
            embed_query_in_path: config.embed_query_in_path,
        }
    }
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}

/// The routing normalizer: an immutable, ordered rule table.
#[derive(Debug)]
pub struct Normalizer {
    locales: Arc<LocaleSet>,
    settings: RuleSettings,
    rules: Vec<Box<dyn Rule>>,
}

impl Normalizer {
    /// Build a normalizer with the standard rule order.
    pub fn new(locales: Arc<LocaleSet>, settings: RuleSettings) -> Self {
        Self::with_rules(locales, settings, rules::standard_rules())
    }

    /// Build a normalizer with a custom rule table.
    pub fn with_rules(
        locales: Arc<LocaleSet>,
        settings: RuleSettings,
        rules: Vec<Box<dyn Rule>>,
    ) -> Self {
        Self {
            locales,
            settings,
            rules,
        }
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }

    /// Names of the rules in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluate the rule table for one request.
    pub fn decide(&self, request: &RequestAttrs) -> Decision {
        let ctx = RuleContext::new(request, &self.locales, &self.settings);

        for rule in &self.rules {
            if let Outcome::Halt(action) = rule.evaluate(&ctx) {
                return Decision {
                    rule: rule.name(),
                    action,
                };
            }
        }

        Decision {
            rule: PASS_THROUGH,
            action: RoutingAction::PassThrough,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        let locales = LocaleSet::new(["en-us", "fr-ca"], "en-us").unwrap();
        Normalizer::new(Arc::new(locales), RuleSettings::default())
    }

    fn rewrite(target: &str) -> RoutingAction {
        RoutingAction::Rewrite {
            target: target.to_string(),
        }
    }

    fn redirect(location: &str) -> RoutingAction {
        RoutingAction::Redirect {
            location: location.to_string(),
            status: 307,
        }
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            normalizer().rule_names(),
            vec![
                "preview-entry",
                "preview-exit",
                "dynamic-content",
                "asset-bypass",
                "lang-override",
                "locale-prefix",
                "query-rewrite",
            ]
        );
    }

    #[test]
    fn test_unprefixed_path_gets_default_locale() {
        let n = normalizer();
        for path in ["/home", "/breakfast-menu", "/a/b/c", "/en-usa/x"] {
            let decision = n.decide(&RequestAttrs::new(path, ""));
            assert_eq!(decision.action, rewrite(&format!("/en-us{path}")));
            assert_eq!(decision.rule, "locale-prefix");
        }
    }

    #[test]
    fn test_root_path() {
        let decision = normalizer().decide(&RequestAttrs::new("/", ""));
        assert_eq!(decision.action, rewrite("/en-us/"));
    }

    #[test]
    fn test_preview_entry_takes_priority() {
        let n = normalizer();
        let decision = n.decide(&RequestAttrs::new(
            "/foo",
            "agilitypreviewkey=XYZ&lang=en-us&ContentID=7",
        ));
        assert_eq!(
            decision.action,
            redirect("/api/preview?locale=en-us&ContentID=7&slug=%2Ffoo&agilitypreviewkey=XYZ")
        );

        // Even on an asset path with a preview-exit flag present.
        let decision = n.decide(&RequestAttrs::new(
            "/logo.png",
            "AgilityPreview=0&agilitypreviewkey=a%2Bb",
        ));
        assert_eq!(
            decision.action,
            redirect("/api/preview?locale=&ContentID=&slug=%2Flogo.png&agilitypreviewkey=a%2Bb")
        );
    }

    #[test]
    fn test_preview_exit() {
        let decision = normalizer().decide(&RequestAttrs::new(
            "/fr-ca/menu",
            "AgilityPreview=0&lang=fr-ca&ContentID=12",
        ));
        assert_eq!(
            decision.action,
            redirect("/api/preview/exit?locale=fr-ca&ContentID=12&slug=%2Ffr-ca%2Fmenu")
        );

        let decision = normalizer().decide(&RequestAttrs::new("/menu", "AgilityPreview=1"));
        assert_ne!(decision.rule, "preview-exit");
    }

    #[test]
    fn test_dynamic_content() {
        let n = normalizer();
        let decision = n.decide(&RequestAttrs::new("/anything", "ContentID=42"));
        assert_eq!(decision.action, rewrite("/api/dynamic-redirect?ContentID=42"));

        for bad in ["-3", "abc", "0", ""] {
            let decision = n.decide(&RequestAttrs::new("/anything", &format!("ContentID={bad}")));
            assert_ne!(decision.rule, "dynamic-content", "ContentID={bad}");
        }
    }

    #[test]
    fn test_invalid_content_id_falls_through() {
        let decision = normalizer().decide(&RequestAttrs::new("/menu", "ContentID=abc"));
        assert_eq!(decision.action, rewrite("/en-us/menu/~~~ContentID%3Dabc~~~"));
    }

    #[test]
    fn test_asset_bypass() {
        let n = normalizer();
        let decision = n.decide(&RequestAttrs::new("/images/logo.png", "lang=fr-ca&v=2"));
        assert_eq!(decision.action, RoutingAction::PassThrough);
        assert_eq!(decision.rule, "asset-bypass");

        // A dot in an earlier segment is not an extension.
        let decision = n.decide(&RequestAttrs::new("/v1.2/menu", ""));
        assert_eq!(decision.action, rewrite("/en-us/v1.2/menu"));
    }

    #[test]
    fn test_query_embedded_for_prefixed_locale() {
        let decision = normalizer().decide(&RequestAttrs::new("/fr-ca/menu", "size=large"));
        assert_eq!(decision.action, rewrite("/fr-ca/menu/~~~size%3Dlarge~~~"));
        assert_eq!(decision.rule, "query-rewrite");
    }

    #[test]
    fn test_query_embedded_before_locale_prefix() {
        let decision = normalizer().decide(&RequestAttrs::new("/menu", "size=large&x=1"));
        assert_eq!(
            decision.action,
            rewrite("/en-us/menu/~~~size%3Dlarge%26x%3D1~~~")
        );
    }

    #[test]
    fn test_default_lang_on_prefixed_path_redirects_to_canonical() {
        let decision = normalizer().decide(&RequestAttrs::new("/en-us/home", "lang=en-us"));
        assert_eq!(decision.action, redirect("/home"));
    }

    #[test]
    fn test_lang_switch_preserves_other_params() {
        let n = normalizer();
        let decision = n.decide(&RequestAttrs::new("/en-us/home", "a=1&lang=fr-ca&b=two+words"));
        assert_eq!(decision.action, redirect("/fr-ca/home?a=1&b=two+words"));

        let decision = n.decide(&RequestAttrs::new("/fr-ca/home", "lang=en-us&size=s"));
        assert_eq!(decision.action, redirect("/home?size=s"));

        let decision = n.decide(&RequestAttrs::new("/home", "lang=fr-ca"));
        assert_eq!(decision.action, redirect("/fr-ca/home"));
    }

    #[test]
    fn test_lang_matching_current_locale_is_ignored() {
        let n = normalizer();
        let decision = n.decide(&RequestAttrs::new("/fr-ca/home", "lang=fr-ca"));
        assert_eq!(decision.action, rewrite("/fr-ca/home/~~~lang%3Dfr-ca~~~"));

        let decision = n.decide(&RequestAttrs::new("/home", "lang=en-us"));
        assert_eq!(decision.action, rewrite("/en-us/home/~~~lang%3Den-us~~~"));
    }

    #[test]
    fn test_unknown_lang_is_ignored() {
        let decision = normalizer().decide(&RequestAttrs::new("/home", "lang=de-de"));
        assert_eq!(decision.action, rewrite("/en-us/home/~~~lang%3Dde-de~~~"));
    }

    #[test]
    fn test_framework_paths_not_prefixed() {
        let decision = normalizer().decide(&RequestAttrs::new("/_next/webpack-hmr", ""));
        assert_eq!(decision.action, RoutingAction::PassThrough);
    }

    #[test]
    fn test_locale_rewrite_is_idempotent() {
        let n = normalizer();
        for (path, query) in [("/home", ""), ("/menu", "size=large"), ("/", "")] {
            let first = n.decide(&RequestAttrs::new(path, query));
            let RoutingAction::Rewrite { target } = first.action else {
                panic!("expected rewrite for {path}");
            };
            let second = n.decide(&RequestAttrs::new(target.clone(), ""));
            assert_eq!(second.action, RoutingAction::PassThrough, "{target}");

            // Same query state as the original request.
            let second = n.decide(&RequestAttrs::new(target.clone(), query));
            assert_eq!(second.action, RoutingAction::PassThrough, "{target}?{query}");
        }
    }

    #[test]
    fn test_changed_query_replaces_embedded_token() {
        let decision = normalizer().decide(&RequestAttrs::new(
            "/en-us/menu/~~~size%3Dlarge~~~",
            "size=small",
        ));
        assert_eq!(decision.rule, "query-rewrite");
        assert_eq!(decision.action, rewrite("/en-us/menu/~~~size%3Dsmall~~~"));
    }

    #[test]
    fn test_token_with_dot_is_not_an_asset() {
        let decision = normalizer().decide(&RequestAttrs::new(
            "/en-us/menu/~~~v%3D1.2~~~",
            "lang=fr-ca",
        ));
        assert_eq!(decision.rule, "lang-override");
        assert_eq!(decision.action, redirect("/fr-ca/menu/~~~v%3D1.2~~~"));
    }

    #[test]
    fn test_embedding_disabled_keeps_query_native() {
        let locales = LocaleSet::new(["en-us", "fr-ca"], "en-us").unwrap();
        let settings = RuleSettings {
            embed_query_in_path: false,
            ..RuleSettings::default()
        };
        let n = Normalizer::new(Arc::new(locales), settings);

        let decision = n.decide(&RequestAttrs::new("/menu", "size=large"));
        assert_eq!(decision.action, rewrite("/en-us/menu?size=large"));

        let decision = n.decide(&RequestAttrs::new("/fr-ca/menu", "size=large"));
        assert_eq!(decision.action, RoutingAction::PassThrough);
    }

    #[test]
    fn test_from_http() {
        let uri: Uri = "/fr-ca/menu?size=large".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "signage.example.com".parse().unwrap());
        headers.insert("x-forwarded-proto", "https, http".parse().unwrap());

        let attrs = RequestAttrs::from_http(&uri, &headers);
        assert_eq!(attrs.path, "/fr-ca/menu");
        assert_eq!(attrs.query.get("size"), Some("large"));
        assert_eq!(attrs.origin().as_deref(), Some("https://signage.example.com"));
    }

    #[test]
    fn test_parse_url() {
        let attrs = RequestAttrs::parse_url("http://localhost:3000/menu?lang=fr-ca").unwrap();
        assert_eq!(attrs.path, "/menu");
        assert_eq!(attrs.host.as_deref(), Some("localhost:3000"));
        assert_eq!(attrs.query.get("lang"), Some("fr-ca"));
    }
}
