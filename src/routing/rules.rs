//! The ordered routing rules.
//!
//! Each rule inspects the request and either produces an action or defers
//! to the next rule. Order is fixed by [`standard_rules`].

use std::fmt;

use crate::i18n::LocaleSet;
use crate::routing::normalizer::{RequestAttrs, RoutingAction, RuleSettings};
use crate::routing::query::encode_component;
use crate::routing::search_token;

/// Query parameter carrying the CMS preview key.
pub const PREVIEW_KEY_PARAM: &str = "agilitypreviewkey";
/// Query parameter toggling preview mode; `"0"` exits.
pub const PREVIEW_TOGGLE_PARAM: &str = "AgilityPreview";
/// Query parameter naming a content item.
pub const CONTENT_ID_PARAM: &str = "ContentID";
/// Query parameter requesting a locale.
pub const LANG_PARAM: &str = "lang";

/// Result of evaluating a single rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Defer to the next rule.
    Next,
    /// Stop evaluation with this action.
    Halt(RoutingAction),
}

/// One entry of the rule table.
pub trait Rule: Send + Sync + fmt::Debug {
    /// Stable name used in logs and metrics.
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Outcome;
}

/// Everything a rule may look at.
#[derive(Debug)]
pub struct RuleContext<'a> {
    pub request: &'a RequestAttrs,
    pub locales: &'a LocaleSet,
    pub settings: &'a RuleSettings,
    /// The request path with the query embedded as a search token, or the
    /// plain path when embedding is off.
    pub token_path: String,
}

impl<'a> RuleContext<'a> {
    pub fn new(request: &'a RequestAttrs, locales: &'a LocaleSet, settings: &'a RuleSettings) -> Self {
        let token_path = if settings.embed_query_in_path {
            search_token::append(&request.path, &request.query)
        } else {
            request.path.clone()
        };
        Self {
            request,
            locales,
            settings,
            token_path,
        }
    }

    fn redirect(&self, location: String) -> Outcome {
        Outcome::Halt(RoutingAction::Redirect {
            location,
            status: self.settings.redirect_status,
        })
    }

    fn param(&self, key: &str) -> &str {
        self.request.query.get(key).unwrap_or("")
    }
}

/// The rule table in priority order.
pub fn standard_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(PreviewEntry),
        Box::new(PreviewExit),
        Box::new(DynamicContent),
        Box::new(AssetBypass),
        Box::new(LangOverride),
        Box::new(LocalePrefix),
        Box::new(QueryRewrite),
    ]
}

/// Redirects editor requests carrying a preview key to the preview endpoint.
#[derive(Debug, Clone, Copy)]
pub struct PreviewEntry;

impl Rule for PreviewEntry {
    fn name(&self) -> &'static str {
        "preview-entry"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Outcome {
        let Some(key) = ctx.request.query.get(PREVIEW_KEY_PARAM) else {
            return Outcome::Next;
        };
        ctx.redirect(format!(
            "{}?locale={}&ContentID={}&slug={}&agilitypreviewkey={}",
            ctx.settings.preview_endpoint,
            encode_component(ctx.param(LANG_PARAM)),
            encode_component(ctx.param(CONTENT_ID_PARAM)),
            encode_component(&ctx.request.path),
            encode_component(key),
        ))
    }
}

/// Redirects `AgilityPreview=0` to the preview exit endpoint.
#[derive(Debug, Clone, Copy)]
pub struct PreviewExit;

impl Rule for PreviewExit {
    fn name(&self) -> &'static str {
        "preview-exit"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Outcome {
        if ctx.request.query.get(PREVIEW_TOGGLE_PARAM) != Some("0") {
            return Outcome::Next;
        }
        ctx.redirect(format!(
            "{}?locale={}&ContentID={}&slug={}",
            ctx.settings.preview_exit_endpoint,
            encode_component(ctx.param(LANG_PARAM)),
            encode_component(ctx.param(CONTENT_ID_PARAM)),
            encode_component(&ctx.request.path),
        ))
    }
}

/// Rewrites a positive `ContentID` to the dynamic redirect endpoint.
#[derive(Debug, Clone, Copy)]
pub struct DynamicContent;

impl Rule for DynamicContent {
    fn name(&self) -> &'static str {
        "dynamic-content"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Outcome {
        match ctx.request.query.get(CONTENT_ID_PARAM).and_then(parse_content_id) {
            Some(id) => Outcome::Halt(RoutingAction::Rewrite {
                target: format!(
                    "{}?{}={}",
                    ctx.settings.dynamic_redirect_endpoint, CONTENT_ID_PARAM, id
                ),
            }),
            None => Outcome::Next,
        }
    }
}

/// Serves paths with a file extension as-is, skipping every later rule.
#[derive(Debug, Clone, Copy)]
pub struct AssetBypass;

impl Rule for AssetBypass {
    fn name(&self) -> &'static str {
        "asset-bypass"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Outcome {
        if has_extension(&ctx.request.path) {
            Outcome::Halt(RoutingAction::PassThrough)
        } else {
            Outcome::Next
        }
    }
}

/// Redirects `?lang=` to the matching locale-prefixed path.
#[derive(Debug, Clone, Copy)]
pub struct LangOverride;

impl Rule for LangOverride {
    fn name(&self) -> &'static str {
        "lang-override"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Outcome {
        let locales = ctx.locales;
        let Some(lang) = ctx.request.query.get(LANG_PARAM) else {
            return Outcome::Next;
        };
        if !locales.is_valid_locale(lang) {
            return Outcome::Next;
        }

        let path = &ctx.request.path;
        let path_locale = locales.locale_from_path(path);
        let current = path_locale.unwrap_or(locales.default_locale());
        // `/en-us/...` with `lang=en-us` is still redirected: default-locale
        // paths are canonical without a prefix.
        let explicit_default = locales.is_default(lang) && path_locale == Some(lang);
        if lang == current && !explicit_default {
            return Outcome::Next;
        }

        let unprefixed = locales.strip_locale(path, current);
        let target = if locales.is_default(lang) {
            unprefixed
        } else {
            format!("/{lang}{unprefixed}")
        };
        ctx.redirect(ctx.request.query.without(LANG_PARAM).append_to(&target))
    }
}

/// Rewrites unprefixed paths under the default locale.
#[derive(Debug, Clone, Copy)]
pub struct LocalePrefix;

impl Rule for LocalePrefix {
    fn name(&self) -> &'static str {
        "locale-prefix"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Outcome {
        if ctx.locales.has_locale_prefix(&ctx.token_path) || is_framework_path(&ctx.request.path) {
            return Outcome::Next;
        }
        let target = format!("/{}{}", ctx.locales.default_locale(), ctx.token_path);
        let target = if ctx.settings.embed_query_in_path {
            target
        } else {
            ctx.request.query.append_to(&target)
        };
        Outcome::Halt(RoutingAction::Rewrite { target })
    }
}

/// Rewrites to the token path so the renderer sees no query string.
#[derive(Debug, Clone, Copy)]
pub struct QueryRewrite;

impl Rule for QueryRewrite {
    fn name(&self) -> &'static str {
        "query-rewrite"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Outcome {
        if !ctx.settings.embed_query_in_path
            || ctx.request.query.is_empty()
            || ctx.token_path == ctx.request.path
        {
            return Outcome::Next;
        }
        Outcome::Halt(RoutingAction::Rewrite {
            target: ctx.token_path.clone(),
        })
    }
}

/// Parse a content id with `parseInt` leniency: leading whitespace and a
/// sign are accepted, trailing non-digits ignored. Only positive values
/// are returned. Unlike `parseInt`, digits beyond `u64::MAX` yield `None`.
pub fn parse_content_id(raw: &str) -> Option<u64> {
    let s = raw.trim_start();
    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let value: u64 = unsigned[..end].parse().ok()?;
    if negative || value == 0 {
        None
    } else {
        Some(value)
    }
}

/// Returns true if the last path segment has a non-empty extension.
/// Search tokens are never extensions, whatever dots the query holds.
pub fn has_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    if search_token::is_token(last) {
        return false;
    }
    matches!(last.rsplit_once('.'), Some((_, ext)) if !ext.is_empty())
}

fn is_framework_path(path: &str) -> bool {
    path.starts_with("/_next")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(rule: &dyn Rule, path: &str, query: &str) -> Outcome {
        let locales = LocaleSet::new(["en-us", "fr-ca", "es-mx"], "en-us").unwrap();
        let settings = RuleSettings::default();
        let request = RequestAttrs::new(path, query);
        let ctx = RuleContext::new(&request, &locales, &settings);
        rule.evaluate(&ctx)
    }

    #[test]
    fn test_parse_content_id() {
        assert_eq!(parse_content_id("42"), Some(42));
        assert_eq!(parse_content_id("  7"), Some(7));
        assert_eq!(parse_content_id("+9"), Some(9));
        assert_eq!(parse_content_id("42abc"), Some(42));
        assert_eq!(parse_content_id("-3"), None);
        assert_eq!(parse_content_id("0"), None);
        assert_eq!(parse_content_id("abc"), None);
        assert_eq!(parse_content_id(""), None);
        assert_eq!(parse_content_id("-"), None);
        assert_eq!(parse_content_id("99999999999999999999999"), None);
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("/favicon.ico"));
        assert!(has_extension("/assets/menu/board.webp"));
        assert!(!has_extension("/menu"));
        assert!(!has_extension("/v1.2/menu"));
        assert!(!has_extension("/menu."));
        assert!(!has_extension("/"));
        assert!(!has_extension("/en-us/menu/~~~v%3D1.2~~~"));
    }

    #[test]
    fn test_dynamic_content_uses_parsed_value() {
        assert_eq!(
            eval(&DynamicContent, "/x", "ContentID=42abc"),
            Outcome::Halt(RoutingAction::Rewrite {
                target: "/api/dynamic-redirect?ContentID=42".into()
            })
        );
    }

    #[test]
    fn test_lang_override_between_non_default_locales() {
        assert_eq!(
            eval(&LangOverride, "/fr-ca/menu", "lang=es-mx"),
            Outcome::Halt(RoutingAction::Redirect {
                location: "/es-mx/menu".into(),
                status: 307
            })
        );
    }

    #[test]
    fn test_lang_override_from_locale_root() {
        assert_eq!(
            eval(&LangOverride, "/fr-ca", "lang=en-us"),
            Outcome::Halt(RoutingAction::Redirect {
                location: "/".into(),
                status: 307
            })
        );
    }

    #[test]
    fn test_rules_defer_without_their_params() {
        for rule in standard_rules().iter().take(3) {
            assert_eq!(eval(rule.as_ref(), "/menu", "size=large"), Outcome::Next);
        }
        assert_eq!(eval(&LangOverride, "/menu", "size=large"), Outcome::Next);
        assert_eq!(eval(&AssetBypass, "/menu", ""), Outcome::Next);
    }

    #[test]
    fn test_query_rewrite_skips_prefix_check() {
        assert_eq!(
            eval(&QueryRewrite, "/menu", "a=1"),
            Outcome::Halt(RoutingAction::Rewrite {
                target: "/menu/~~~a%3D1~~~".into()
            })
        );
        assert_eq!(eval(&QueryRewrite, "/menu", ""), Outcome::Next);
    }
}
