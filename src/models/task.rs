// Task model
// One tracked unit of assistant work: progress, token count, status, provenance

use serde::{Deserialize, Serialize};
use super::common::{Adapter, TaskStatus};

/// A tracked assistant task. Serializes with camelCase field names for the
/// frontend; the snake_case feed wire shape lives in `models::feed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    /// 0-100, clamped by every mutator
    pub progress: u32,
    pub tokens: u64,
    pub status: TaskStatus,
    /// Epoch millis, set at creation or reset
    pub startTime: i64,
    /// Epoch millis, set when the task enters completed/error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endTime: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adapter: Option<Adapter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ide: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windowTitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projectPath: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activeFile: Option<String>,
}

impl Task {
    pub fn new(
        id: String,
        name: String,
        adapter: Option<Adapter>,
        ide: Option<String>,
        windowTitle: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            progress: 0,
            tokens: 0,
            status: TaskStatus::Idle,
            startTime: crate::commands::common::now(),
            endTime: None,
            adapter,
            ide,
            windowTitle,
            projectPath: None,
            activeFile: None,
        }
    }

    /// Wall time the task ran for, when it has ended
    pub fn durationMillis(&self) -> Option<i64> {
        self.endTime.map(|end| (end - self.startTime).max(0))
    }
}

/// Render a duration like "2m 13s" for notification bodies
pub fn formatDuration(millis: i64) -> String {
    let totalSeconds = (millis / 1000).max(0);
    let minutes = totalSeconds / 60;
    let seconds = totalSeconds % 60;
    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_defaults() {
        let task = Task::new("t1".into(), "Refactor".into(), None, None, None);
        assert_eq!(task.progress, 0);
        assert_eq!(task.tokens, 0);
        assert_eq!(task.status, TaskStatus::Idle);
        assert!(task.startTime > 0);
        assert!(task.endTime.is_none());
    }

    #[test]
    fn test_duration() {
        let mut task = Task::new("t1".into(), "x".into(), None, None, None);
        task.startTime = 1_000;
        task.endTime = Some(63_500);
        assert_eq!(task.durationMillis(), Some(62_500));
        assert_eq!(formatDuration(62_500), "1m 2s");
        assert_eq!(formatDuration(8_000), "8s");
    }
}
