//! The set of supported locales and path-prefix helpers.

use thiserror::Error;

/// Errors raised when a locale set violates its invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocaleError {
    /// No locale codes were configured.
    #[error("locale set is empty")]
    Empty,

    /// A code is empty or whitespace only.
    #[error("locale code at index {0} is empty")]
    BlankCode(usize),

    /// The same code appears more than once.
    #[error("locale code '{0}' is listed more than once")]
    Duplicate(String),

    /// The default locale is not one of the configured codes.
    #[error("default locale '{0}' is not in the locale set")]
    DefaultNotMember(String),
}

/// Ordered list of supported locale codes with a designated default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSet {
    locales: Vec<String>,
    default_locale: String,
}

impl LocaleSet {
    /// Build a locale set, checking every invariant.
    pub fn new<I, S>(locales: I, default_locale: impl Into<String>) -> Result<Self, LocaleError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let locales: Vec<String> = locales.into_iter().map(Into::into).collect();
        let default_locale = default_locale.into();

        if locales.is_empty() {
            return Err(LocaleError::Empty);
        }

        for (i, code) in locales.iter().enumerate() {
            if code.trim().is_empty() {
                return Err(LocaleError::BlankCode(i));
            }
            if locales[..i].contains(code) {
                return Err(LocaleError::Duplicate(code.clone()));
            }
        }

        if !locales.contains(&default_locale) {
            return Err(LocaleError::DefaultNotMember(default_locale));
        }

        Ok(Self {
            locales,
            default_locale,
        })
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn is_default(&self, code: &str) -> bool {
        self.default_locale == code
    }

    /// Returns true if `code` is one of the configured locales.
    pub fn is_valid_locale(&self, code: &str) -> bool {
        self.locales.iter().any(|l| l == code)
    }

    /// The locale named by the first path segment, if it is a member.
    pub fn locale_from_path<'a>(&'a self, path: &str) -> Option<&'a str> {
        let first = path.strip_prefix('/')?.split('/').next()?;
        self.locales
            .iter()
            .find(|l| l.as_str() == first)
            .map(String::as_str)
    }

    /// Returns true if the path starts with any locale as a whole segment.
    pub fn has_locale_prefix(&self, path: &str) -> bool {
        self.locale_from_path(path).is_some()
    }

    /// Remove `locale` from the front of `path`.
    ///
    /// `/en-us` becomes `/`, `/en-us/menu` becomes `/menu`. Paths that do not
    /// start with the locale segment are returned unchanged.
    pub fn strip_locale(&self, path: &str, locale: &str) -> String {
        let Some(rest) = path.strip_prefix('/').and_then(|p| p.strip_prefix(locale)) else {
            return path.to_string();
        };
        if rest.is_empty() {
            "/".to_string()
        } else if rest.starts_with('/') {
            rest.to_string()
        } else {
            path.to_string()
        }
    }
}
