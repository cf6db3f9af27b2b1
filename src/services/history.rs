// src/services/history.rs

//! Change-history verification.
//!
//! Fetches an issue's change-history tab and decides whether the issue
//! bounced from verification back into fixing within the current month.

use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Utc};
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::TrackerConfig;
use crate::services::extract::parse_selector;
use crate::services::session::DocumentSource;

/// Timestamp format used by the history table.
const EVENT_TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

/// One (field, old value, new value) change within an event.
///
/// Transient: these exist only while the verification predicate is being
/// evaluated and are discarded afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChangeAction {
    field: String,
    old_value: String,
    new_value: String,
}

/// One change-history event block: who changed what, when.
#[derive(Debug, Clone)]
struct ChangeEvent {
    author: String,
    at: NaiveDateTime,
    actions: Vec<ChangeAction>,
}

/// Evaluates the "verification failed this month" predicate for an issue.
pub struct HistoryVerifier {
    source: Arc<dyn DocumentSource>,
    tracker: TrackerConfig,
    event_block: Selector,
    author_link: Selector,
    event_time: Selector,
    action_name: Selector,
    action_old: Selector,
    action_new: Selector,
}

impl HistoryVerifier {
    pub fn new(source: Arc<dyn DocumentSource>, tracker: TrackerConfig) -> Result<Self> {
        Ok(Self {
            source,
            tracker,
            event_block: parse_selector(r#"div[id^="changehistory-"]"#)?,
            author_link: parse_selector(r#"a[id*="changehistoryauthor"]"#)?,
            event_time: parse_selector("span.date time")?,
            action_name: parse_selector("td.activity-name")?,
            action_old: parse_selector("td.activity-old-val")?,
            action_new: parse_selector("td.activity-new-val")?,
        })
    }

    /// Whether the issue at `detail_url` failed verification this month.
    ///
    /// The request carries the tracker's history-panel page id plus a
    /// millisecond timestamp token, the same way the tracker's own frontend
    /// busts intermediary caches, so history is re-fetched on every
    /// evaluation.
    pub async fn is_verified_nopass(&self, detail_url: &str) -> Result<bool> {
        let params = vec![
            ("page".to_string(), self.tracker.history_panel.clone()),
            ("_".to_string(), Utc::now().timestamp_millis().to_string()),
        ];
        let body = self.source.fetch_with_params(detail_url, &params).await?;
        let events = self.parse_events(&body)?;
        Ok(self.rejected_in_month(&events, Local::now().date_naive()))
    }

    /// Parse every change-event block out of a history document.
    fn parse_events(&self, body: &str) -> Result<Vec<ChangeEvent>> {
        let document = Html::parse_document(body);
        let mut events = Vec::new();

        for block in document.select(&self.event_block) {
            let author = block
                .select(&self.author_link)
                .next()
                .map(text_of)
                .ok_or_else(|| AppError::structure("change history", "event without author link"))?;
            let at_text = block
                .select(&self.event_time)
                .next()
                .map(text_of)
                .ok_or_else(|| AppError::structure("change history", "event without timestamp"))?;
            let at = NaiveDateTime::parse_from_str(&at_text, EVENT_TIME_FORMAT)?;

            // The three cell lists line up within a single event block.
            let actions = block
                .select(&self.action_name)
                .map(text_of)
                .zip(block.select(&self.action_old).map(text_of))
                .zip(block.select(&self.action_new).map(text_of))
                .map(|((field, old_value), new_value)| ChangeAction {
                    field,
                    old_value,
                    new_value,
                })
                .collect();

            events.push(ChangeEvent { author, at, actions });
        }

        Ok(events)
    }

    /// True when some event in the same month as `today` changed the status
    /// field from the awaiting-verification state back to the fixing state.
    ///
    /// Year and month must both match, so an event from last December never
    /// counts toward this December.
    fn rejected_in_month(&self, events: &[ChangeEvent], today: NaiveDate) -> bool {
        for event in events {
            let date = event.at.date();
            if date.year() != today.year() || date.month() != today.month() {
                continue;
            }
            for action in &event.actions {
                if action.field == self.tracker.status_field
                    && action.old_value == self.tracker.verify_old_value
                    && action.new_value == self.tracker.verify_new_value
                {
                    log::debug!(
                        "Verification failed on {} (changed by {})",
                        event.at,
                        event.author
                    );
                    return true;
                }
            }
        }
        false
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
