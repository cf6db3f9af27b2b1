//! Issue data structure.

use serde::{Deserialize, Serialize};

/// One issue extracted from the tracker's listing report.
///
/// Identity is structural: two issues with identical field values are the
/// same issue for deduplication, while issues differing in any single field
/// (e.g. `updated_time`) are distinct entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Issue {
    /// Issue type shown by the tracker (e.g. "defect", "requirement")
    #[serde(rename = "type")]
    pub kind: String,

    /// Summary line
    pub title: String,

    /// Tracker-defined workflow state name
    pub status: String,

    /// Severity label; `None` when the report's severity cell is empty
    pub severity: Option<String>,

    /// Creation date as displayed, `YYYY/MM/DD`
    pub created_time: String,

    /// Last-update display string
    pub updated_time: String,

    /// Whether verification of this issue failed during the current month
    pub is_verified_nopass: bool,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn sample_issue() -> Issue {
        Issue {
            kind: "defect".to_string(),
            title: "Login button unresponsive".to_string(),
            status: "open".to_string(),
            severity: Some("minor".to_string()),
            created_time: "2025/06/02".to_string(),
            updated_time: "2025/06/10".to_string(),
            is_verified_nopass: false,
        }
    }

    #[test]
    fn identical_issues_collapse_in_a_set() {
        let mut set = HashSet::new();
        set.insert(sample_issue());
        set.insert(sample_issue());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn differing_updated_time_is_a_distinct_issue() {
        let mut set = HashSet::new();
        set.insert(sample_issue());
        let mut other = sample_issue();
        other.updated_time = "2025/06/11".to_string();
        set.insert(other);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn serializes_kind_as_type() {
        let json = serde_json::to_string(&sample_issue()).unwrap();
        assert!(json.contains("\"type\":\"defect\""));
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample_issue());
    }
}
