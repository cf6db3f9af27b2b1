// src/metrics.rs

//! Monthly defect metrics over a collected issue set.
//!
//! Pure iteration over the store; "this month" always means the same year
//! and month as the supplied reference date.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use crate::models::{Issue, MetricsConfig};
use crate::store::IssueStore;

/// Display date format of the listing's created-time column.
const CREATED_FORMAT: &str = "%Y/%m/%d";

/// Aggregated monthly quality metrics.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsReport {
    /// Bugs created this month
    pub new_bugs: usize,

    /// Bugs not yet closed, regardless of age
    pub open_bugs: usize,

    /// Open bugs older than the configured staleness window
    pub stale_bugs: usize,

    /// Minor-severity bugs created this month
    pub minor_bugs: usize,

    /// `minor_bugs / new_bugs`, two decimals; `"0.00"` when nothing is new
    pub minor_rate: String,

    /// Major-severity bugs created this month
    pub major_bugs: usize,

    /// `major_bugs / new_bugs`, two decimals; `"0.00"` when nothing is new
    pub major_rate: String,

    /// Bugs that failed verification this month
    pub verified_nopass: usize,
}

impl MetricsReport {
    /// Compute every metric over the store, with `today` as the reference
    /// date for month membership and staleness.
    pub fn collect(store: &IssueStore, config: &MetricsConfig, today: NaiveDate) -> Result<Self> {
        let mut new_bugs = 0;
        let mut open_bugs = 0;
        let mut stale_bugs = 0;
        let mut minor_bugs = 0;
        let mut major_bugs = 0;
        let mut verified_nopass = 0;

        for issue in store {
            if issue.kind != config.defect_type {
                continue;
            }

            let created = NaiveDate::parse_from_str(&issue.created_time, CREATED_FORMAT)?;
            let new_this_month = same_month(created, today);
            let open = issue.status != config.closed_status;

            if new_this_month {
                new_bugs += 1;
                if has_severity_in(issue, &config.minor_severities) {
                    minor_bugs += 1;
                }
                if has_severity_in(issue, &config.major_severities) {
                    major_bugs += 1;
                }
            }
            if open {
                open_bugs += 1;
                if (today - created).num_days() > config.stale_after_days {
                    stale_bugs += 1;
                }
            }
            if issue.is_verified_nopass {
                verified_nopass += 1;
            }
        }

        Ok(Self {
            new_bugs,
            open_bugs,
            stale_bugs,
            minor_bugs,
            minor_rate: rate(minor_bugs, new_bugs),
            major_bugs,
            major_rate: rate(major_bugs, new_bugs),
            verified_nopass,
        })
    }
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "new bugs: {}, open bugs: {}, stale bugs: {}, \
             minor bugs: {} (rate {}), major bugs: {} (rate {}), \
             verification failures: {}",
            self.new_bugs,
            self.open_bugs,
            self.stale_bugs,
            self.minor_bugs,
            self.minor_rate,
            self.major_bugs,
            self.major_rate,
            self.verified_nopass,
        )
    }
}

fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

fn has_severity_in(issue: &Issue, severities: &[String]) -> bool {
    issue
        .severity
        .as_ref()
        .is_some_and(|s| severities.iter().any(|candidate| candidate == s))
}

/// Share of `part` in `whole` formatted with two decimals; a month with no
/// new bugs reports `"0.00"` instead of dividing by zero.
fn rate(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", part as f64 / whole as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bug(created: &str, status: &str, severity: Option<&str>, nopass: bool) -> Issue {
        Issue {
            kind: "defect".to_string(),
            title: format!("bug created {created}"),
            status: status.to_string(),
            severity: severity.map(str::to_string),
            created_time: created.to_string(),
            updated_time: created.to_string(),
            is_verified_nopass: nopass,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 20).unwrap()
    }

    #[test]
    fn severity_rate_counts_minor_share_of_new_bugs() {
        let mut store = IssueStore::new();
        let severities = [
            Some("minor"),
            Some("trivial"),
            Some("minor"),
            Some("severe"),
            None,
            None,
            None,
            None,
            None,
            None,
        ];
        store.merge(
            severities
                .iter()
                .enumerate()
                .map(|(i, severity)| bug(&format!("2025/06/{:02}", i + 1), "open", *severity, false)),
        );

        let report = MetricsReport::collect(&store, &MetricsConfig::default(), today()).unwrap();
        assert_eq!(report.new_bugs, 10);
        assert_eq!(report.minor_bugs, 3);
        assert_eq!(report.minor_rate, "0.30");
        assert_eq!(report.major_bugs, 1);
        assert_eq!(report.major_rate, "0.10");
    }

    #[test]
    fn rate_is_zero_safe_when_no_new_bugs() {
        let mut store = IssueStore::new();
        store.merge([bug("2025/04/01", "open", Some("minor"), false)]);

        let report = MetricsReport::collect(&store, &MetricsConfig::default(), today()).unwrap();
        assert_eq!(report.new_bugs, 0);
        assert_eq!(report.minor_rate, "0.00");
        assert_eq!(report.major_rate, "0.00");
    }

    #[test]
    fn open_and_stale_counting() {
        let mut store = IssueStore::new();
        store.merge([
            bug("2025/06/18", "open", None, false), // open, 2 days old
            bug("2025/06/01", "open", None, false), // open, 19 days old
            bug("2025/05/01", "closed", None, false),
        ]);

        let report = MetricsReport::collect(&store, &MetricsConfig::default(), today()).unwrap();
        assert_eq!(report.open_bugs, 2);
        assert_eq!(report.stale_bugs, 1);
    }

    #[test]
    fn last_december_is_not_new_this_december() {
        let mut store = IssueStore::new();
        store.merge([
            bug("2024/12/20", "open", None, false),
            bug("2025/12/02", "open", None, false),
        ]);

        let this_december = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        let report =
            MetricsReport::collect(&store, &MetricsConfig::default(), this_december).unwrap();
        assert_eq!(report.new_bugs, 1);
    }

    #[test]
    fn non_defects_are_never_counted() {
        let mut store = IssueStore::new();
        let mut requirement = bug("2025/06/10", "open", Some("minor"), true);
        requirement.kind = "requirement".to_string();
        store.merge([requirement, bug("2025/06/11", "open", None, true)]);

        let report = MetricsReport::collect(&store, &MetricsConfig::default(), today()).unwrap();
        assert_eq!(report.new_bugs, 1);
        assert_eq!(report.open_bugs, 1);
        assert_eq!(report.verified_nopass, 1);
    }

    #[test]
    fn unparseable_created_time_is_an_error() {
        let mut store = IssueStore::new();
        store.merge([bug("June 2nd", "open", None, false)]);
        assert!(MetricsReport::collect(&store, &MetricsConfig::default(), today()).is_err());
    }

    #[test]
    fn summary_line_layout() {
        let mut store = IssueStore::new();
        store.merge([bug("2025/06/02", "open", Some("minor"), true)]);

        let report = MetricsReport::collect(&store, &MetricsConfig::default(), today()).unwrap();
        assert_eq!(
            report.to_string(),
            "new bugs: 1, open bugs: 1, stale bugs: 0, minor bugs: 1 (rate 1.00), \
             major bugs: 0 (rate 0.00), verification failures: 1"
        );
    }
}
