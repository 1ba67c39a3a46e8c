//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the locale set invariants
//! - Validate value ranges (timeouts > 0, addresses parse, status codes)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;

use thiserror::Error;

use crate::config::schema::EdgeConfig;
use crate::i18n::{LocaleError, LocaleSet};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("locales: {0}")]
    Locales(#[from] LocaleError),

    #[error("{field}: '{value}' is not a valid socket address")]
    Address { field: &'static str, value: String },

    #[error("{field}: '{value}' is not a valid host:port")]
    HostPort { field: &'static str, value: String },

    #[error("routing.redirect_status: {0} is not a redirect status")]
    RedirectStatus(u16),

    #[error("{field}: '{value}' must start with '/'")]
    RelativePath { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("cms.guid is required when redirections are enabled")]
    MissingGuid,
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = LocaleSet::new(config.locales.codes.clone(), config.locales.default.clone()) {
        errors.push(e.into());
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_host_port(&mut errors, "upstream.address", &config.upstream.address);

    if !matches!(config.routing.redirect_status, 301 | 302 | 303 | 307 | 308) {
        errors.push(ValidationError::RedirectStatus(config.routing.redirect_status));
    }

    let routing = &config.routing;
    check_path(&mut errors, "routing.preview_endpoint", &routing.preview_endpoint);
    check_path(&mut errors, "routing.preview_exit_endpoint", &routing.preview_exit_endpoint);
    check_path(
        &mut errors,
        "routing.dynamic_redirect_endpoint",
        &routing.dynamic_redirect_endpoint,
    );
    for prefix in &routing.excluded_prefixes {
        check_path(&mut errors, "routing.excluded_prefixes", prefix);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    }
    if config.timeouts.cms_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.cms_secs"));
    }

    if config.cms.redirections_enabled {
        if config.cms.guid.trim().is_empty() {
            errors.push(ValidationError::MissingGuid);
        }
        if config.cms.redirections_refresh_secs == 0 {
            errors.push(ValidationError::Zero("cms.redirections_refresh_secs"));
        }
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}

/// Hostnames are allowed; the upstream connector resolves them.
fn check_host_port(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    let valid = Authority::from_str(value)
        .map(|a| a.port_u16().is_some() && !a.host().is_empty())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::HostPort {
            field,
            value: value.to_string(),
        });
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            field,
            value: value.to_string(),
        });
    }
}
