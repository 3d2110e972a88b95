// History entry - a frozen snapshot of a task at completion time

use serde::{Deserialize, Serialize};
use super::common::{Adapter, TaskStatus};
use super::task::Task;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub name: String,
    pub progress: u32,
    pub tokens: u64,
    pub status: TaskStatus,
    pub startTime: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endTime: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter: Option<Adapter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ide: Option<String>,
}

impl From<&Task> for HistoryEntry {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id.clone(),
            name: t.name.clone(),
            progress: t.progress,
            tokens: t.tokens,
            status: t.status,
            startTime: t.startTime,
            endTime: t.endTime,
            adapter: t.adapter,
            ide: t.ide.clone(),
        }
    }
}
