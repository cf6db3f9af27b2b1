//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Tracker-specific endpoints and workflow labels
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Monthly metric classification rules
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// CSS selectors for the listing report markup
    #[serde(default)]
    pub selectors: ListingSelectors,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.tracker.login_path.trim().is_empty() {
            return Err(AppError::validation("tracker.login_path is empty"));
        }
        if self.tracker.status_field.trim().is_empty() {
            return Err(AppError::validation("tracker.status_field is empty"));
        }
        if self.metrics.defect_type.trim().is_empty() {
            return Err(AppError::validation("metrics.defect_type is empty"));
        }
        if self.selectors.row.trim().is_empty() {
            return Err(AppError::validation("selectors.row is empty"));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between listing pages in seconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_secs: u64,

    /// Maximum concurrent change-history requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_delay_secs: defaults::page_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Tracker endpoints and the workflow labels that mark a failed verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Login form path, resolved against the report URL's origin
    #[serde(default = "defaults::login_path")]
    pub login_path: String,

    /// Value of the `page` parameter selecting the change-history tab panel
    #[serde(default = "defaults::history_panel")]
    pub history_panel: String,

    /// Field name of a status change in the history table
    #[serde(default = "defaults::status_field")]
    pub status_field: String,

    /// Status an issue holds while awaiting verification
    #[serde(default = "defaults::verify_old_value")]
    pub verify_old_value: String,

    /// Status an issue is sent back to when verification fails
    #[serde(default = "defaults::verify_new_value")]
    pub verify_new_value: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            login_path: defaults::login_path(),
            history_panel: defaults::history_panel(),
            status_field: defaults::status_field(),
            verify_old_value: defaults::verify_old_value(),
            verify_new_value: defaults::verify_new_value(),
        }
    }
}

/// Classification rules for the monthly metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Issue type counted as a bug
    #[serde(default = "defaults::defect_type")]
    pub defect_type: String,

    /// Status of a closed issue
    #[serde(default = "defaults::closed_status")]
    pub closed_status: String,

    /// Severity labels counted as minor
    #[serde(default = "defaults::minor_severities")]
    pub minor_severities: Vec<String>,

    /// Severity labels counted as major
    #[serde(default = "defaults::major_severities")]
    pub major_severities: Vec<String>,

    /// Open bugs older than this many days are stale
    #[serde(default = "defaults::stale_after_days")]
    pub stale_after_days: i64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            defect_type: defaults::defect_type(),
            closed_status: defaults::closed_status(),
            minor_severities: defaults::minor_severities(),
            major_severities: defaults::major_severities(),
            stale_after_days: defaults::stale_after_days(),
        }
    }
}

/// CSS selectors describing one listing report row and its page counters.
///
/// Defaults match the tracker's stock report markup; deployments with
/// renamed custom fields override the severity cell here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Selector for one issue row
    #[serde(default = "defaults::row")]
    pub row: String,

    /// Issue-type icon within a row; its `alt` text is the type label
    #[serde(default = "defaults::kind_icon")]
    pub kind_icon: String,

    /// Summary link within a row; text is the title, `href` the detail page
    #[serde(default = "defaults::title_link")]
    pub title_link: String,

    /// Status label within a row
    #[serde(default = "defaults::status_label")]
    pub status_label: String,

    /// Severity custom-field cell within a row (optional per row)
    #[serde(default = "defaults::severity_cell")]
    pub severity_cell: String,

    /// Creation time element within a row
    #[serde(default = "defaults::created_time")]
    pub created_time: String,

    /// Update time element within a row
    #[serde(default = "defaults::updated_time")]
    pub updated_time: String,

    /// Page-level marker: highest issue ordinal shown on this page
    #[serde(default = "defaults::count_end")]
    pub count_end: String,

    /// Page-level marker: total issue count across all pages
    #[serde(default = "defaults::count_total")]
    pub count_total: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row: defaults::row(),
            kind_icon: defaults::kind_icon(),
            title_link: defaults::title_link(),
            status_label: defaults::status_label(),
            severity_cell: defaults::severity_cell(),
            created_time: defaults::created_time(),
            updated_time: defaults::updated_time(),
            count_end: defaults::count_end(),
            count_total: defaults::count_total(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; bugtally/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn page_delay() -> u64 {
        3
    }
    pub fn max_concurrent() -> usize {
        10
    }

    // Tracker defaults
    pub fn login_path() -> String {
        "/login.jsp".into()
    }
    pub fn history_panel() -> String {
        "com.atlassian.jira.plugin.system.issuetabpanels:changehistory-tabpanel".into()
    }
    pub fn status_field() -> String {
        "status".into()
    }
    pub fn verify_old_value() -> String {
        "pending verification".into()
    }
    pub fn verify_new_value() -> String {
        "pending fix".into()
    }

    // Metrics defaults
    pub fn defect_type() -> String {
        "defect".into()
    }
    pub fn closed_status() -> String {
        "closed".into()
    }
    pub fn minor_severities() -> Vec<String> {
        vec!["minor".into(), "trivial".into()]
    }
    pub fn major_severities() -> Vec<String> {
        vec!["severe".into(), "critical".into()]
    }
    pub fn stale_after_days() -> i64 {
        7
    }

    // Selector defaults
    pub fn row() -> String {
        "tr:has(td.issuetype)".into()
    }
    pub fn kind_icon() -> String {
        "td.issuetype img".into()
    }
    pub fn title_link() -> String {
        "td.summary a.issue-link".into()
    }
    pub fn status_label() -> String {
        "td.status span".into()
    }
    pub fn severity_cell() -> String {
        "td.customfield_10121".into()
    }
    pub fn created_time() -> String {
        "td.created time".into()
    }
    pub fn updated_time() -> String {
        "td.updated time".into()
    }
    pub fn count_end() -> String {
        "span.results-count-end".into()
    }
    pub fn count_total() -> String {
        r#"span[class*="results-count-total"]"#.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.crawler.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_defect_type() {
        let mut config = Config::default();
        config.metrics.defect_type = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_overrides_merge_with_defaults() {
        let config: Config = toml::from_str(
            r#"
            [crawler]
            max_concurrent = 4

            [tracker]
            status_field = "状态"
            "#,
        )
        .unwrap();
        assert_eq!(config.crawler.max_concurrent, 4);
        assert_eq!(config.crawler.page_delay_secs, 3);
        assert_eq!(config.tracker.status_field, "状态");
        assert_eq!(config.metrics.defect_type, "defect");
    }
}
