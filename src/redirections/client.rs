//! CMS client for URL redirections and the background refresher.
//!
//! # Responsibilities
//! - Call the content API's redirection endpoint
//! - Turn failures into an empty, not-up-to-date table
//! - Refresh the shared store on an interval until shutdown

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::CmsConfig;
use crate::redirections::table::{RedirectionFeed, RedirectionStore, RedirectionTable};

/// Errors that can occur while talking to the CMS.
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("CMS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CMS returned status {0}")]
    Status(u16),
}

/// Minimal content API client.
#[derive(Debug, Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    base_url: String,
    guid: String,
    api_key: String,
    preview: bool,
}

impl CmsClient {
    pub fn new(config: &CmsConfig, timeout: Duration) -> Result<Self, CmsError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            guid: config.guid.clone(),
            api_key: config.api_key().to_string(),
            preview: config.is_preview(),
        })
    }

    fn endpoint(&self, resource: &str) -> String {
        let mode = if self.preview { "preview" } else { "fetch" };
        format!("{}/{}/{}/{}", self.base_url, self.guid, mode, resource)
    }

    /// Fetch redirections changed since `last_access_date` (all when `None`).
    pub async fn url_redirections(
        &self,
        last_access_date: Option<&str>,
    ) -> Result<RedirectionFeed, CmsError> {
        let mut request = self
            .http
            .get(self.endpoint("urlredirection"))
            .header("APIKey", &self.api_key);
        if let Some(date) = last_access_date {
            request = request.query(&[("lastAccessDate", date)]);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(CmsError::Status(response.status().as_u16()));
        }
        Ok(response.json::<RedirectionFeed>().await?)
    }
}

/// Fetch the redirection table. Never fails: errors degrade to an empty,
/// not-up-to-date table so the caller can try again later.
pub async fn fetch_redirections(
    client: &CmsClient,
    last_access_date: Option<&str>,
    force: bool,
) -> RedirectionTable {
    match client.url_redirections(last_access_date).await {
        Ok(feed) => RedirectionTable::from_feed(feed, force),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch redirections");
            RedirectionTable::unavailable()
        }
    }
}

/// Periodically refreshes a [`RedirectionStore`].
pub struct RedirectionRefresher {
    store: Arc<RedirectionStore>,
    client: CmsClient,
    interval: Duration,
}

impl RedirectionRefresher {
    pub fn new(store: Arc<RedirectionStore>, client: CmsClient, interval: Duration) -> Self {
        Self {
            store,
            client,
            interval,
        }
    }

    /// Refresh once. The first load (no access date yet) takes every item.
    pub async fn refresh(&self) {
        let since = self.store.last_access_date();
        let force = since.is_none();
        let table = fetch_redirections(&self.client, since.as_deref(), force).await;
        let outcome = self.store.apply(table);
        tracing::debug!(outcome = outcome.as_str(), "Redirections refreshed");
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Redirection refresher starting");

        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.refresh().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Redirection refresher received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
