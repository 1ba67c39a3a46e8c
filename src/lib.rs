//! Signage edge: locale-aware request routing in front of a CMS-driven
//! signage renderer.

pub mod config;
pub mod http;
pub mod i18n;
pub mod lifecycle;
pub mod observability;
pub mod redirections;
pub mod routing;

pub use config::EdgeConfig;
pub use http::EdgeServer;
pub use i18n::LocaleSet;
pub use lifecycle::Shutdown;
pub use routing::{Decision, Normalizer, RequestAttrs, RoutingAction};
