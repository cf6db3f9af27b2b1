// src/services/session.rs

//! Authenticated document fetching with a session-scoped page cache.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use url::Url;

use crate::error::Result;
use crate::models::Config;
use crate::utils::with_params;

/// Source of raw document text, keyed by URL.
///
/// `Session` is the production implementation; tests substitute in-memory
/// sources serving static documents.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetch the document at `url`.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Fetch with query parameters folded into the effective URL.
    async fn fetch_with_params(&self, url: &str, params: &[(String, String)]) -> Result<String> {
        let effective = with_params(url, params)?;
        self.fetch(&effective).await
    }
}

/// Process-lifetime memo of fetched pages, keyed by effective URL.
///
/// Never evicted and never invalidated. Shared between the crawler and the
/// history workers, so mutation goes through an async lock; workers only race
/// on distinct keys.
#[derive(Default)]
pub struct PageCache {
    pages: RwLock<HashMap<String, String>>,
}

impl PageCache {
    /// Return the cached body for `url`, if any.
    pub async fn get(&self, url: &str) -> Option<String> {
        self.pages.read().await.get(url).cloned()
    }

    /// Remember the body fetched for `url`.
    pub async fn store(&self, url: String, body: String) {
        self.pages.write().await.insert(url, body);
    }
}

/// Authenticated tracker session.
///
/// Owns the HTTP client (with the login cookies) and the page cache; every
/// document retrieval in the crawl goes through [`Session::fetch`].
pub struct Session {
    client: Client,
    cache: PageCache,
}

impl Session {
    /// Log into the tracker and return a session ready for fetching.
    ///
    /// Posts the login form to the tracker's authentication endpoint,
    /// resolved against the report URL's origin. The client carries the
    /// session cookies on every subsequent request. Transport or
    /// authentication failures propagate to the caller.
    pub async fn login(
        config: &Config,
        report_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.crawler.user_agent)
            .timeout(Duration::from_secs(config.crawler.timeout_secs))
            .cookie_store(true)
            .build()?;

        let login_url = Url::parse(report_url)?.join(&config.tracker.login_path)?;
        log::info!("Logging in as {username} at {login_url}");
        client
            .post(login_url)
            .form(&[("os_username", username), ("os_password", password)])
            .send()
            .await?
            .error_for_status()?;

        Ok(Self {
            client,
            cache: PageCache::default(),
        })
    }
}

#[async_trait]
impl DocumentSource for Session {
    async fn fetch(&self, url: &str) -> Result<String> {
        if let Some(body) = self.cache.get(url).await {
            log::debug!("Cache hit for {url}");
            return Ok(body);
        }

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        self.cache.store(url.to_string(), body.clone()).await;
        Ok(body)
    }
}
