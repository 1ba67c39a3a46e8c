//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query, host)
//!     → matcher.rs (is the path in the normalizer's scope?)
//!     → normalizer.rs (build RequestAttrs, run rule table)
//!     → rules.rs (preview → exit → content id → asset → lang → locale → query)
//!     → Return: Redirect, Rewrite or PassThrough
//!
//! Rule Table Compilation (at startup):
//!     RoutingConfig + LocaleSet
//!     → RuleSettings
//!     → Freeze as immutable Normalizer
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (prefix and segment matching only)
//! - Deterministic: same input always yields the same action
//! - First match wins (fixed priority order)

pub mod matcher;
pub mod normalizer;
pub mod query;
pub mod rules;
pub mod search_token;

pub use matcher::RouteScope;
pub use normalizer::{Decision, Normalizer, RequestAttrs, RoutingAction, RuleSettings};
pub use query::QueryParams;
