//! Locale subsystem.
//!
//! # Data Flow
//! ```text
//! LocaleConfig (codes + default)
//!     → locale_set.rs (validate invariants)
//!     → LocaleSet (immutable, shared via Arc)
//!     → routing rules query membership and path prefixes
//! ```
//!
//! # Design Decisions
//! - Built once at startup; never mutated afterwards
//! - A locale matches a path only as a full first segment
//! - Codes compare exactly (no case folding)

pub mod locale_set;

pub use locale_set::{LocaleError, LocaleSet};
