//! Redirection entries, key normalization and the shared table.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use crate::observability::metrics;

/// One URL redirection as served by the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirection {
    pub id: i64,
    pub origin_url: String,
    pub destination_url: String,
    pub status_code: u16,
}

/// Raw redirection payload.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectionFeed {
    #[serde(default)]
    pub last_access_date: Option<String>,
    #[serde(default)]
    pub is_up_to_date: bool,
    #[serde(default)]
    pub items: Vec<Redirection>,
}

/// How a table relates to what the store already holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    /// Items are a full replacement.
    Changed,
    /// Server reported no changes; items are empty.
    UpToDate,
    /// Fetch failed; items are empty.
    Unavailable,
}

/// Redirections keyed by normalized origin path.
#[derive(Debug, Clone)]
pub struct RedirectionTable {
    pub last_access_date: Option<String>,
    pub is_up_to_date: bool,
    pub status: TableStatus,
    pub items: HashMap<String, Redirection>,
}

impl RedirectionTable {
    /// Build a table from a CMS response.
    ///
    /// Items are only kept when the server reports changes or `force` is set.
    pub fn from_feed(feed: RedirectionFeed, force: bool) -> Self {
        let changed = !feed.is_up_to_date || force;
        let items = if changed {
            feed.items
                .into_iter()
                .map(|mut r| {
                    r.destination_url = normalize_destination(&r.destination_url);
                    (normalize_origin(&r.origin_url), r)
                })
                .collect()
        } else {
            HashMap::new()
        };

        Self {
            last_access_date: feed.last_access_date,
            is_up_to_date: feed.is_up_to_date,
            status: if changed {
                TableStatus::Changed
            } else {
                TableStatus::UpToDate
            },
            items,
        }
    }

    /// Empty, not-up-to-date table standing in for a failed fetch.
    pub fn unavailable() -> Self {
        Self {
            last_access_date: None,
            is_up_to_date: false,
            status: TableStatus::Unavailable,
            items: HashMap::new(),
        }
    }

    pub fn empty() -> Self {
        Self {
            last_access_date: None,
            is_up_to_date: false,
            status: TableStatus::Changed,
            items: HashMap::new(),
        }
    }

    /// Look up the redirection for a request path.
    pub fn lookup(&self, path: &str) -> Option<&Redirection> {
        self.items.get(&path.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Lowercase, drop the `~` of `~/`, and reduce absolute URLs to their path.
pub fn normalize_origin(origin: &str) -> String {
    let mut key = origin.to_lowercase();
    if key.starts_with("~/") {
        key.remove(0);
    }
    if let Some(scheme_end) = key.find("://") {
        let host_start = scheme_end + 3;
        key = match key[host_start..].find('/') {
            Some(i) => key[host_start + i..].to_string(),
            None => "/".to_string(),
        };
    }
    key
}

/// Drop the `~` of an application-relative `~/` destination.
pub fn normalize_destination(destination: &str) -> String {
    match destination.strip_prefix('~') {
        Some(rest) if rest.starts_with('/') => rest.to_string(),
        _ => destination.to_string(),
    }
}

/// Outcome of applying a refreshed table to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated(usize),
    Unchanged,
    Failed,
}

impl RefreshOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshOutcome::Updated(_) => "updated",
            RefreshOutcome::Unchanged => "unchanged",
            RefreshOutcome::Failed => "failed",
        }
    }
}

/// The current redirection table, swapped atomically on refresh.
pub struct RedirectionStore {
    current: ArcSwap<RedirectionTable>,
}

impl RedirectionStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(RedirectionTable::empty()),
        }
    }

    pub fn snapshot(&self) -> Arc<RedirectionTable> {
        self.current.load_full()
    }

    pub fn lookup(&self, path: &str) -> Option<Redirection> {
        self.current.load().lookup(path).cloned()
    }

    pub fn last_access_date(&self) -> Option<String> {
        self.current.load().last_access_date.clone()
    }

    /// Merge a freshly fetched table into the store.
    ///
    /// Up-to-date and failed refreshes keep the existing entries.
    pub fn apply(&self, table: RedirectionTable) -> RefreshOutcome {
        let outcome = match table.status {
            TableStatus::Changed => {
                let count = table.len();
                self.current.store(Arc::new(table));
                RefreshOutcome::Updated(count)
            }
            TableStatus::UpToDate => {
                let previous = self.current.load();
                self.current.store(Arc::new(RedirectionTable {
                    last_access_date: table.last_access_date,
                    is_up_to_date: true,
                    status: TableStatus::UpToDate,
                    items: previous.items.clone(),
                }));
                RefreshOutcome::Unchanged
            }
            TableStatus::Unavailable => RefreshOutcome::Failed,
        };

        metrics::record_redirection_refresh(outcome.as_str());
        metrics::record_redirection_entries(self.current.load().len());
        outcome
    }
}

impl Default for RedirectionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirection(id: i64, origin: &str, destination: &str) -> Redirection {
        Redirection {
            id,
            origin_url: origin.into(),
            destination_url: destination.into(),
            status_code: 301,
        }
    }

    fn feed(up_to_date: bool, items: Vec<Redirection>) -> RedirectionFeed {
        RedirectionFeed {
            last_access_date: Some("2026-10-19T12:00:00Z".into()),
            is_up_to_date: up_to_date,
            items,
        }
    }

    #[test]
    fn test_normalize_origin() {
        assert_eq!(normalize_origin("~/Old-Menu"), "/old-menu");
        assert_eq!(normalize_origin("https://Signage.example.com/Promo/Fall"), "/promo/fall");
        assert_eq!(normalize_origin("https://signage.example.com"), "/");
        assert_eq!(normalize_origin("/lunch"), "/lunch");
    }

    #[test]
    fn test_normalize_destination() {
        assert_eq!(normalize_destination("~/en-us/lunch-menu"), "/en-us/lunch-menu");
        assert_eq!(normalize_destination("https://example.com/x"), "https://example.com/x");
        assert_eq!(normalize_destination("~other"), "~other");
    }

    #[test]
    fn test_from_feed() {
        let table = RedirectionTable::from_feed(
            feed(false, vec![redirection(1, "~/Old", "~/new")]),
            false,
        );
        assert_eq!(table.status, TableStatus::Changed);
        let hit = table.lookup("/OLD").unwrap();
        assert_eq!(hit.destination_url, "/new");

        let table = RedirectionTable::from_feed(
            feed(true, vec![redirection(1, "/old", "/new")]),
            false,
        );
        assert_eq!(table.status, TableStatus::UpToDate);
        assert!(table.is_empty());

        let table = RedirectionTable::from_feed(
            feed(true, vec![redirection(1, "/old", "/new")]),
            true,
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_store_keeps_entries_on_failure_and_up_to_date() {
        let store = RedirectionStore::new();
        let outcome = store.apply(RedirectionTable::from_feed(
            feed(false, vec![redirection(1, "/old", "/new")]),
            false,
        ));
        assert_eq!(outcome, RefreshOutcome::Updated(1));

        assert_eq!(store.apply(RedirectionTable::unavailable()), RefreshOutcome::Failed);
        assert!(store.lookup("/old").is_some());

        let outcome = store.apply(RedirectionTable::from_feed(feed(true, vec![]), false));
        assert_eq!(outcome, RefreshOutcome::Unchanged);
        assert!(store.lookup("/old").is_some());
        assert!(store.snapshot().is_up_to_date);

        let outcome = store.apply(RedirectionTable::from_feed(feed(false, vec![]), false));
        assert_eq!(outcome, RefreshOutcome::Updated(0));
        assert!(store.lookup("/old").is_none());
    }

    #[test]
    fn test_feed_deserializes_camel_case() {
        let feed: RedirectionFeed = serde_json::from_str(
            r#"{
                "lastAccessDate": "2026-10-19T12:00:00Z",
                "isUpToDate": false,
                "items": [
                    {"id": 3, "originUrl": "~/promo", "destinationUrl": "~/en-us/fall", "statusCode": 302}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(feed.items[0].status_code, 302);
        assert_eq!(feed.items[0].origin_url, "~/promo");
    }
}
