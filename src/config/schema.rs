//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the signage edge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Supported locales.
    pub locales: LocaleConfig,

    /// Routing normalizer settings.
    pub routing: RoutingConfig,

    /// The renderer requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// Headless CMS access.
    pub cms: CmsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Locale set configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleConfig {
    /// Locale codes in display order (e.g., "en-us").
    pub codes: Vec<String>,

    /// Locale served without a path prefix.
    pub default: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            codes: vec!["en-us".to_string()],
            default: "en-us".to_string(),
        }
    }
}

/// Routing normalizer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path prefixes the normalizer never touches.
    pub excluded_prefixes: Vec<String>,

    /// Preview activation endpoint.
    pub preview_endpoint: String,

    /// Preview exit endpoint.
    pub preview_exit_endpoint: String,

    /// Endpoint resolving a content id to its page.
    pub dynamic_redirect_endpoint: String,

    /// Status code used for normalizer redirects.
    pub redirect_status: u16,

    /// Carry query strings as a path segment for path-keyed caches.
    /// Turn off when the renderer caches by full URL.
    pub embed_query_in_path: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec![
                "/api".to_string(),
                "/assets".to_string(),
                "/_next/static".to_string(),
                "/_next/image".to_string(),
                "/favicon.ico".to_string(),
            ],
            preview_endpoint: "/api/preview".to_string(),
            preview_exit_endpoint: "/api/preview/exit".to_string(),
            dynamic_redirect_endpoint: "/api/dynamic-redirect".to_string(),
            redirect_status: 307,
            embed_query_in_path: true,
        }
    }
}

/// Upstream renderer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Renderer address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// How the preview flag for CMS access is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreviewMode {
    /// Always read published content.
    #[default]
    Never,
    /// Always read draft content.
    Always,
    /// Read draft content only when `environment` is "development".
    Environment,
}

/// Headless CMS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CmsConfig {
    /// Instance GUID.
    pub guid: String,

    /// API key for published content.
    pub fetch_api_key: String,

    /// API key for draft content.
    pub preview_api_key: String,

    /// Content API base URL.
    pub base_url: String,

    /// Preview flag selection.
    pub preview_mode: PreviewMode,

    /// Deployment environment name (e.g., "production", "development").
    pub environment: String,

    /// Periodically load URL redirections from the CMS.
    pub redirections_enabled: bool,

    /// Redirection refresh interval in seconds.
    pub redirections_refresh_secs: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            guid: String::new(),
            fetch_api_key: String::new(),
            preview_api_key: String::new(),
            base_url: "https://api.aglty.io".to_string(),
            preview_mode: PreviewMode::Never,
            environment: "production".to_string(),
            redirections_enabled: false,
            redirections_refresh_secs: 60,
        }
    }
}

impl CmsConfig {
    /// Whether CMS reads should see draft content.
    pub fn is_preview(&self) -> bool {
        match self.preview_mode {
            PreviewMode::Never => false,
            PreviewMode::Always => true,
            PreviewMode::Environment => self.environment == "development",
        }
    }

    /// The API key matching [`Self::is_preview`].
    pub fn api_key(&self) -> &str {
        if self.is_preview() {
            &self.preview_api_key
        } else {
            &self.fetch_api_key
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// CMS API call timeout in seconds.
    pub cms_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            cms_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
