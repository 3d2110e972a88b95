// Status synchronizer
// Polls the local status feed once per second and reconciles the result into
// the store. A failed or slow poll leaves the last known state in place; the
// next tick simply tries again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{FeedTask, StatusDocument};
use crate::store::StoreState;

/// How often the feed is polled
const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// A hung fetch must not stall later ticks
const FETCH_TIMEOUT: Duration = Duration::from_secs(2);

pub struct Synchronizer {
    store: StoreState,
    client: reqwest::Client,
    /// Guards against a tick firing while the previous fetch is still in
    /// flight; overlapping merges would race on the same payload
    polling: AtomicBool,
}

impl Synchronizer {
    pub fn new(store: StoreState) -> Arc<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Arc::new(Self {
            store,
            client,
            polling: AtomicBool::new(false),
        })
    }

    /// Poll loop; runs for the lifetime of the app
    pub async fn run(self: Arc<Self>) {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            self.poll().await;
        }
    }

    async fn poll(&self) {
        if self.polling.swap(true, Ordering::SeqCst) {
            debug!("previous poll still in flight, skipping tick");
            return;
        }

        match self.fetchStatus().await {
            Ok(document) => {
                let current = document.currentTask.as_ref().map(|c| c.id.clone());
                let records = parseRecords(document);
                self.store.applyFeed(records, current);
            }
            Err(e) => {
                warn!(error = %e, "status poll failed, keeping last known state");
            }
        }

        self.polling.store(false, Ordering::SeqCst);
    }

    async fn fetchStatus(&self) -> Result<StatusDocument, reqwest::Error> {
        let (host, port) = {
            let settings = self.store.settings.read();
            (settings.httpHost.clone(), settings.httpPort)
        };
        let url = format!("http://{}:{}/api/status", host, port);
        self.client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<StatusDocument>()
            .await
    }
}

/// Validate feed records one by one. A malformed record is skipped with a
/// warning; it never aborts the rest of the payload.
pub fn parseRecords(document: StatusDocument) -> Vec<FeedTask> {
    let mut records = Vec::with_capacity(document.tasks.len());
    for value in document.tasks {
        match serde_json::from_value::<FeedTask>(value) {
            Ok(record) => records.push(record),
            Err(e) => warn!(error = %e, "skipping malformed feed record"),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    fn document(value: serde_json::Value) -> StatusDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_records_skips_malformed_entries() {
        let doc = document(serde_json::json!({
            "tasks": [
                { "id": "a", "name": "Good", "progress": 40, "status": "running",
                  "start_time": 1000, "end_time": null },
                { "name": "missing id", "status": "running" },
                { "id": "b", "name": "Bad status", "status": "exploded" },
                { "id": "c", "name": "Also good", "progress": 100, "tokens": 12,
                  "status": "completed", "start_time": 1, "end_time": 2,
                  "ide": "cursor", "window_title": "main.rs" }
            ],
            "currentTask": { "id": "a" },
            "taskCount": 4
        }));

        let records = parseRecords(doc);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].status, TaskStatus::Running);
        assert_eq!(records[1].id, "c");
        assert_eq!(records[1].tokens, Some(12));
        assert_eq!(records[1].ide.as_deref(), Some("cursor"));
    }

    #[test]
    fn test_parse_records_tolerates_extra_fields() {
        let doc = document(serde_json::json!({
            "tasks": [
                { "id": "a", "name": "Task", "progress": 10, "status": "armed",
                  "is_focused": true, "source": "plugin", "last_heartbeat": 123 }
            ],
            "currentTask": null,
            "taskCount": 1
        }));

        let records = parseRecords(doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, TaskStatus::Armed);
        // omitted optional fields default cleanly
        assert_eq!(records[0].start_time, 0);
        assert!(records[0].tokens.is_none());
    }

    #[test]
    fn test_empty_document() {
        let doc = document(serde_json::json!({}));
        assert!(parseRecords(doc).is_empty());
    }
}
