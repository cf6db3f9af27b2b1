// src/services/crawler.rs

//! Pagination-driven report crawling.
//!
//! Walks a filtered report from its first page to the last, enriching every
//! row with its change-history verification outcome before the next page is
//! requested.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use scraper::Html;
use url::Url;

use crate::error::Result;
use crate::models::Config;
use crate::services::extract::{IssueRow, ListingParser, PageCounts};
use crate::services::history::HistoryVerifier;
use crate::services::session::DocumentSource;
use crate::store::IssueStore;

/// Crawls a paginated issue report into a deduplicated issue set.
pub struct ReportCrawler {
    source: Arc<dyn DocumentSource>,
    parser: ListingParser,
    verifier: HistoryVerifier,
    config: Arc<Config>,
}

impl ReportCrawler {
    /// Create a crawler reading through the given document source.
    pub fn new(source: Arc<dyn DocumentSource>, config: Arc<Config>) -> Result<Self> {
        let parser = ListingParser::new(&config.selectors)?;
        let verifier = HistoryVerifier::new(Arc::clone(&source), config.tracker.clone())?;
        Ok(Self {
            source,
            parser,
            verifier,
            config,
        })
    }

    /// Walk the report page by page, returning the collected issue set.
    ///
    /// Each page is fully processed, including all of its concurrent history
    /// checks, before the next page is fetched. Any fetch or parse failure
    /// aborts the whole crawl.
    pub async fn run(&self, root_url: &str) -> Result<IssueStore> {
        let mut store = IssueStore::new();
        let mut page_url = root_url.to_string();
        let mut page_no = 1usize;

        loop {
            log::info!("Fetching listing page {page_no}: {page_url}");
            let body = self.source.fetch(&page_url).await?;
            let base = Url::parse(&page_url)?;

            // Parse synchronously; the document is gone before any await.
            let (rows, counts) = {
                let document = Html::parse_document(&body);
                let rows = self.parser.extract_rows(&document, &base)?;
                let counts = self.parser.page_counts(&document)?;
                (rows, counts)
            };
            log::info!(
                "Page {page_no}: {} rows, {}/{} issues listed",
                rows.len(),
                counts.end,
                counts.total
            );

            let flags = self.verify_all(&rows).await?;
            store.merge(
                rows.into_iter()
                    .zip(flags)
                    .map(|(row, flag)| row.into_issue(flag)),
            );

            let delay = Duration::from_secs(self.config.crawler.page_delay_secs);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match next_page_url(root_url, counts) {
                Some(next) => {
                    page_url = next;
                    page_no += 1;
                }
                None => break,
            }
        }

        log::info!(
            "Crawl finished: {} unique issues over {page_no} page(s)",
            store.len()
        );
        Ok(store)
    }

    /// Run the history verifier for every row on one page.
    ///
    /// `buffered` bounds the in-flight requests and preserves input order, so
    /// each flag joins back to the row whose link produced it.
    async fn verify_all(&self, rows: &[IssueRow]) -> Result<Vec<bool>> {
        let verifier = &self.verifier;
        stream::iter(rows.iter().map(|row| row.detail_url.clone()))
            .map(|url| async move { verifier.is_verified_nopass(&url).await })
            .buffered(self.config.crawler.max_concurrent.max(1))
            .try_collect()
            .await
    }
}

/// URL of the page after the one described by `counts`, or `None` on the
/// terminal page.
///
/// The next page keeps the root URL's portion before its first `&` and
/// appends the current page's end ordinal as the start index.
fn next_page_url(root_url: &str, counts: PageCounts) -> Option<String> {
    if counts.end >= counts.total {
        return None;
    }
    let head = root_url.split('&').next().unwrap_or(root_url);
    Some(format!("{head}&startIndex={}", counts.end))
}
