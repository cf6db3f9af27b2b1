//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Authenticated fetching with a page cache (`Session`)
//! - Listing-page extraction (`ListingParser`)
//! - Change-history verification (`HistoryVerifier`)
//! - Pagination-driven crawling (`ReportCrawler`)

mod crawler;
mod extract;
mod history;
mod session;

pub use crawler::ReportCrawler;
pub use extract::{IssueRow, ListingParser, PageCounts};
pub use history::HistoryVerifier;
pub use session::{DocumentSource, PageCache, Session};
