// src/services/extract.rs

//! Listing-page extraction.
//!
//! Walks the report's issue rows one row at a time, pulling every field from
//! within the row node. A row with a sparse or missing cell can therefore
//! never shift values onto a neighbouring issue; a row missing a required
//! cell is a structure error instead.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Issue, ListingSelectors};
use crate::utils::resolve_url;

/// Pagination counters read from a listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCounts {
    /// Highest issue ordinal shown on the current page
    pub end: u32,

    /// Total issue count across all pages
    pub total: u32,
}

/// One issue row before history enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRow {
    pub kind: String,
    pub title: String,
    pub status: String,
    pub severity: Option<String>,
    pub created_time: String,
    pub updated_time: String,

    /// Absolute URL of the issue's detail page
    pub detail_url: String,
}

impl IssueRow {
    /// Combine the row with its verification flag into a full record.
    pub fn into_issue(self, is_verified_nopass: bool) -> Issue {
        Issue {
            kind: self.kind,
            title: self.title,
            status: self.status,
            severity: self.severity,
            created_time: self.created_time,
            updated_time: self.updated_time,
            is_verified_nopass,
        }
    }
}

/// Compiled selectors for the listing report markup.
pub struct ListingParser {
    row: Selector,
    kind_icon: Selector,
    title_link: Selector,
    status_label: Selector,
    severity_cell: Selector,
    created_time: Selector,
    updated_time: Selector,
    count_end: Selector,
    count_total: Selector,
}

impl ListingParser {
    /// Compile the configured selectors.
    pub fn new(selectors: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            row: parse_selector(&selectors.row)?,
            kind_icon: parse_selector(&selectors.kind_icon)?,
            title_link: parse_selector(&selectors.title_link)?,
            status_label: parse_selector(&selectors.status_label)?,
            severity_cell: parse_selector(&selectors.severity_cell)?,
            created_time: parse_selector(&selectors.created_time)?,
            updated_time: parse_selector(&selectors.updated_time)?,
            count_end: parse_selector(&selectors.count_end)?,
            count_total: parse_selector(&selectors.count_total)?,
        })
    }

    /// Extract every issue row from a listing page.
    ///
    /// Detail links are resolved against `base`, the page's own URL.
    pub fn extract_rows(&self, document: &Html, base: &Url) -> Result<Vec<IssueRow>> {
        document
            .select(&self.row)
            .enumerate()
            .map(|(index, row)| self.parse_row(index, row, base))
            .collect()
    }

    /// Read the pagination counters from a listing page.
    pub fn page_counts(&self, document: &Html) -> Result<PageCounts> {
        Ok(PageCounts {
            end: read_count(document, &self.count_end, "results-count-end")?,
            total: read_count(document, &self.count_total, "results-count-total")?,
        })
    }

    fn parse_row(&self, index: usize, row: ElementRef<'_>, base: &Url) -> Result<IssueRow> {
        let context = format!("listing row {}", index + 1);
        let missing = |what: &str| AppError::structure(context.clone(), format!("missing {what}"));

        let kind_icon = row
            .select(&self.kind_icon)
            .next()
            .ok_or_else(|| missing("issue-type icon"))?;
        let kind = kind_icon
            .value()
            .attr("alt")
            .ok_or_else(|| missing("alt text on issue-type icon"))?
            .trim()
            .to_string();

        let title_link = row
            .select(&self.title_link)
            .next()
            .ok_or_else(|| missing("summary link"))?;
        let href = title_link
            .value()
            .attr("href")
            .ok_or_else(|| missing("href on summary link"))?;

        let status = row
            .select(&self.status_label)
            .next()
            .map(text_of)
            .ok_or_else(|| missing("status label"))?;

        // Empty or absent severity cells both read as "no severity".
        let severity = row
            .select(&self.severity_cell)
            .next()
            .map(text_of)
            .filter(|s| !s.is_empty());

        let created_time = row
            .select(&self.created_time)
            .next()
            .map(text_of)
            .ok_or_else(|| missing("created time"))?;
        let updated_time = row
            .select(&self.updated_time)
            .next()
            .map(text_of)
            .ok_or_else(|| missing("updated time"))?;

        Ok(IssueRow {
            kind,
            title: text_of(title_link),
            status,
            severity,
            created_time,
            updated_time,
            detail_url: resolve_url(base, href),
        })
    }
}

fn read_count(document: &Html, selector: &Selector, name: &str) -> Result<u32> {
    let element = document
        .select(selector)
        .next()
        .ok_or_else(|| AppError::structure("listing page", format!("missing {name} marker")))?;
    let text = text_of(element);
    text.parse()
        .map_err(|_| AppError::structure("listing page", format!("{name} is not a number: '{text}'")))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
