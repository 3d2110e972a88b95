// Wire types for the HTTP status feed
// Field names are snake_case on the wire and translated to the store's
// camelCase shape at the merge boundary

use serde::{Deserialize, Serialize};
use super::common::TaskStatus;

/// One task record as reported by the status feed. Unknown fields are
/// ignored, so the ingest server may serialize a superset of this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedTask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub progress: u32,
    /// Absent means the source does not track tokens; the local counter is kept
    #[serde(default)]
    pub tokens: Option<u64>,
    pub status: TaskStatus,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub adapter: Option<String>,
    #[serde(default)]
    pub ide: Option<String>,
    #[serde(default)]
    pub window_title: Option<String>,
    #[serde(default)]
    pub project_path: Option<String>,
    #[serde(default)]
    pub active_file: Option<String>,
}

/// Reference to the feed's current task; only the id matters here
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentTaskRef {
    pub id: String,
}

/// Top-level status document. Task records are kept untyped so one malformed
/// record can be skipped without rejecting the whole payload.
#[derive(Debug, Deserialize)]
pub struct StatusDocument {
    #[serde(default)]
    pub tasks: Vec<serde_json::Value>,
    #[serde(default)]
    pub currentTask: Option<CurrentTaskRef>,
    #[serde(default)]
    #[allow(dead_code)] // informational; the tasks array is authoritative
    pub taskCount: usize,
}
