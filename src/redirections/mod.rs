//! CMS URL redirections.
//!
//! # Data Flow
//! ```text
//! Refresher (interval tick):
//!     client.rs (GET urlredirection, APIKey header)
//!     → table.rs (normalize keys, classify changed / up-to-date / failed)
//!     → RedirectionStore::apply (atomic swap)
//!
//! Request path:
//!     renderer answers 404 → store.lookup(path) → redirect if found
//! ```
//!
//! # Design Decisions
//! - Readers never block: the table is swapped, never mutated in place
//! - A failed refresh keeps the previous entries
//! - No retries; the next tick is the retry

pub mod client;
pub mod table;

pub use client::{fetch_redirections, CmsClient, CmsError, RedirectionRefresher};
pub use table::{
    Redirection, RedirectionFeed, RedirectionStore, RedirectionTable, RefreshOutcome, TableStatus,
};
