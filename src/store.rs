// src/store.rs

//! Deduplicated set of collected issues.

use std::collections::HashSet;
use std::collections::hash_set;

use crate::models::Issue;

/// All issues collected by a crawl.
///
/// Set semantics: merging an issue that is already present changes nothing,
/// so re-listed rows and overlapping pages collapse to one record each.
#[derive(Debug, Default, Clone)]
pub struct IssueStore {
    issues: HashSet<Issue>,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge issues into the store (set union).
    pub fn merge(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn contains(&self, issue: &Issue) -> bool {
        self.issues.contains(issue)
    }

    pub fn iter(&self) -> hash_set::Iter<'_, Issue> {
        self.issues.iter()
    }

    /// Return the subset of issues matching every criterion exactly.
    ///
    /// Criteria are `(field name, expected value)` pairs combined with AND
    /// semantics; an unknown field name is ignored rather than an error, and
    /// no criteria at all returns the full store. Boolean fields match
    /// against `"true"`/`"false"`.
    pub fn filter(&self, criteria: &[(&str, &str)]) -> HashSet<Issue> {
        self.issues
            .iter()
            .filter(|issue| {
                criteria
                    .iter()
                    .all(|(field, value)| field_matches(issue, field, value))
            })
            .cloned()
            .collect()
    }
}

impl<'a> IntoIterator for &'a IssueStore {
    type Item = &'a Issue;
    type IntoIter = hash_set::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

fn field_matches(issue: &Issue, field: &str, value: &str) -> bool {
    match field {
        "type" => issue.kind == value,
        "title" => issue.title == value,
        "status" => issue.status == value,
        "severity" => issue.severity.as_deref() == Some(value),
        "created_time" => issue.created_time == value,
        "updated_time" => issue.updated_time == value,
        "is_verified_nopass" => issue.is_verified_nopass.to_string() == value,
        // Unknown criteria are ignored, not errors.
        _ => true,
    }
}
