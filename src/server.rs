// Status feed HTTP server
// Ingest side of the widget: editor extensions report window info and task
// state here, and the synchronizer (ours or a remote widget's) polls
// GET /api/status. State is owned by an explicitly constructed FeedState
// managed by the Tauri app, never a process-wide static.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::common::now;
use crate::models::TaskStatus;

/// Tasks that stop heartbeating disappear from the feed after this long
const HEARTBEAT_TIMEOUT_MS: i64 = 5000;

// ============================================
// FEED TASK
// ============================================

/// One reported task. Field names are the wire shape (snake_case); this is a
/// superset of what the poll client reads back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedTask {
    pub id: String,
    /// Task name (format: "IDE - WindowTitle")
    pub name: String,
    /// Whether the associated editor window currently has focus
    pub is_focused: bool,
    pub ide: String,
    pub window_title: String,
    pub project_path: Option<String>,
    pub active_file: Option<String>,
    pub adapter: Option<String>,
    /// 0-100
    pub progress: u32,
    pub tokens: u64,
    pub status: TaskStatus,
    /// Reporting source: hook > mcp > plugin
    pub source: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    #[serde(default)]
    pub last_heartbeat: i64,
}

/// Source priority: hook (highest) > mcp > plugin (lowest)
fn sourcePriority(source: &str) -> u8 {
    match source {
        "hook" => 3,
        "mcp" => 2,
        "plugin" => 1,
        _ => 0,
    }
}

/// A source may update a task only when its priority is at least the current one
fn canUpdateSource(current: &str, new: &str) -> bool {
    sourcePriority(new) >= sourcePriority(current)
}

fn sortByPriority(tasks: &mut [ReportedTask]) {
    tasks.sort_by(|a, b| {
        sourcePriority(&b.source)
            .cmp(&sourcePriority(&a.source))
            .then_with(|| a.id.cmp(&b.id))
    });
}

// ============================================
// REQUEST / RESPONSE SHAPES
// ============================================

/// Unified window-info report: registration, focus change, and heartbeat
#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub task_id: String,
    pub name: String,
    pub ide: String,
    pub window_title: String,
    #[serde(default)]
    pub is_focused: bool,
    #[serde(default)]
    pub project_path: Option<String>,
    #[serde(default)]
    pub active_file: Option<String>,
    #[serde(default)]
    pub adapter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStateRequest {
    pub task_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub tokens: Option<u64>,
    /// When true, tokens are added to the current count instead of replacing it
    #[serde(default)]
    pub increment: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTaskRequest {
    pub task_id: String,
}

#[derive(Serialize)]
pub struct ApiResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiResponse {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            reason: None,
            error: None,
        }
    }

    fn ignored(reason: &str) -> Self {
        Self {
            status: "ignored".to_string(),
            reason: Some(reason.to_string()),
            error: None,
        }
    }

    fn error(msg: &str) -> Self {
        Self {
            status: "error".to_string(),
            reason: None,
            error: Some(msg.to_string()),
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    #[serde(rename = "currentTask")]
    pub current_task: Option<ReportedTask>,
    pub tasks: Vec<ReportedTask>,
    #[serde(rename = "taskCount")]
    pub task_count: usize,
}

/// Outcome of an update_state call, mapped to an HTTP response by the handler
#[derive(Debug, PartialEq)]
pub enum UpdateOutcome {
    Ok,
    Ignored(&'static str),
    NotFound,
    InvalidStatus(String),
}

// ============================================
// FEED STATE
// ============================================

pub struct FeedState {
    pub tasks: Mutex<Vec<ReportedTask>>,
    pub currentTaskId: Mutex<Option<String>>,
}

impl FeedState {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            currentTaskId: Mutex::new(None),
        }
    }

    /// Upsert window info. Unknown ids auto-register as armed; focus drives
    /// the armed/active pair, and focusing a completed window re-arms it.
    pub fn applyReport(&self, req: ReportRequest) -> ApiResponse {
        let mut tasks = self.tasks.lock().unwrap();

        if let Some(task) = tasks.iter_mut().find(|t| t.id == req.task_id) {
            // heartbeat and focus are tracked regardless of source priority
            task.last_heartbeat = now();
            task.is_focused = req.is_focused;

            if !canUpdateSource(&task.source, "plugin") {
                debug!(task_id = %req.task_id, "report ignored - lower priority source");
                return ApiResponse::ignored("lower_priority_source");
            }

            // focusing a finished window means the user is back at it
            if req.is_focused && task.status == TaskStatus::Completed {
                info!(task_id = %req.task_id, "re-arming completed task (window focused)");
                task.status = TaskStatus::Armed;
                task.progress = 0;
                task.tokens = 0;
                task.start_time = 0;
                task.end_time = None;
            }
            if req.is_focused && task.status == TaskStatus::Armed {
                task.status = TaskStatus::Active;
            }
            if !req.is_focused && task.status == TaskStatus::Active {
                task.status = TaskStatus::Armed;
            }

            task.name = req.name;
            task.ide = req.ide;
            task.window_title = req.window_title;
            if let Some(path) = req.project_path {
                task.project_path = Some(path);
            }
            if let Some(file) = req.active_file {
                task.active_file = Some(file);
            }
            if let Some(adapter) = req.adapter {
                task.adapter = Some(adapter);
            }
        } else {
            info!(task_id = %req.task_id, name = %req.name, ide = %req.ide, "task auto-registered");
            let status = if req.is_focused {
                TaskStatus::Active
            } else {
                TaskStatus::Armed
            };
            tasks.push(ReportedTask {
                id: req.task_id.clone(),
                name: req.name,
                is_focused: req.is_focused,
                ide: req.ide,
                window_title: req.window_title,
                project_path: req.project_path,
                active_file: req.active_file,
                adapter: req.adapter,
                progress: 0,
                tokens: 0,
                status,
                source: "plugin".to_string(),
                start_time: 0,
                end_time: None,
                last_heartbeat: now(),
            });
        }
        drop(tasks);

        *self.currentTaskId.lock().unwrap() = Some(req.task_id);
        ApiResponse::ok()
    }

    /// Apply a progress/token/status update, honoring source priority
    pub fn applyUpdateState(&self, req: &UpdateStateRequest, source: &str) -> UpdateOutcome {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(task) = tasks.iter_mut().find(|t| t.id == req.task_id) else {
            return UpdateOutcome::NotFound;
        };

        if !canUpdateSource(&task.source, source) {
            info!(task_id = %req.task_id, current_source = %task.source, "ignoring update_state - lower priority");
            return UpdateOutcome::Ignored("lower_priority_source");
        }

        if let Some(progress) = req.progress {
            task.progress = progress.min(100);
            debug!(task_id = %req.task_id, progress = %task.progress, "progress updated");
        }

        if let Some(tokens) = req.tokens {
            task.tokens = if req.increment {
                task.tokens.saturating_add(tokens)
            } else {
                tokens
            };
        }

        if let Some(ref status) = req.status {
            let Some(status) = TaskStatus::parse(status) else {
                return UpdateOutcome::InvalidStatus(status.clone());
            };
            let old = task.status;
            task.status = status;
            task.source = source.to_string();

            if status == TaskStatus::Running && task.start_time == 0 {
                task.start_time = now();
                info!(task_id = %req.task_id, "task started");
            }
            if status.isTerminal() {
                if task.end_time.is_none() {
                    task.end_time = Some(now());
                }
                if status == TaskStatus::Completed {
                    task.progress = 100;
                }
                info!(task_id = %req.task_id, old_status = %old.asStr(), new_status = %status.asStr(), "task ended");
            }
        }

        UpdateOutcome::Ok
    }

    /// Remove a specific task; true when something was removed
    pub fn deleteTask(&self, taskId: &str) -> bool {
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != taskId);
        let removed = before != tasks.len();
        drop(tasks);

        if removed {
            let mut current = self.currentTaskId.lock().unwrap();
            if current.as_deref() == Some(taskId) {
                *current = None;
            }
            info!(task_id = %taskId, "task deleted");
        }
        removed
    }

    /// Remove one task, or every task when no id is given
    pub fn resetTasks(&self, taskId: Option<&str>) {
        match taskId {
            Some(id) => {
                self.deleteTask(id);
            }
            None => {
                self.tasks.lock().unwrap().clear();
                *self.currentTaskId.lock().unwrap() = None;
                info!("all tasks reset");
            }
        }
    }

    /// Current feed snapshot: stale tasks dropped, priority order, current
    /// task resolved against the surviving list
    pub fn snapshot(&self) -> StatusResponse {
        let nowMs = now();
        let mut tasks = self.tasks.lock().unwrap();

        let before = tasks.len();
        tasks.retain(|t| {
            let age = if t.last_heartbeat > 0 {
                nowMs.saturating_sub(t.last_heartbeat)
            } else {
                0
            };
            age < HEARTBEAT_TIMEOUT_MS
        });
        let removed = before - tasks.len();
        if removed > 0 {
            info!(removed, timeout_ms = HEARTBEAT_TIMEOUT_MS, "cleaned up stale tasks");
        }

        let mut snapshot = tasks.clone();
        drop(tasks);
        sortByPriority(&mut snapshot);

        let currentTaskId = self.currentTaskId.lock().unwrap();
        let current = currentTaskId
            .as_ref()
            .and_then(|id| snapshot.iter().find(|t| t.id == *id))
            .cloned();

        StatusResponse {
            current_task: current,
            task_count: snapshot.len(),
            tasks: snapshot,
        }
    }
}

// ============================================
// HANDLERS
// ============================================

async fn getStatus(State(state): State<Arc<FeedState>>) -> Json<StatusResponse> {
    Json(state.snapshot())
}

async fn reportTask(
    State(state): State<Arc<FeedState>>,
    Json(req): Json<ReportRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    (StatusCode::OK, Json(state.applyReport(req)))
}

async fn updateState(
    State(state): State<Arc<FeedState>>,
    Json(req): Json<UpdateStateRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.applyUpdateState(&req, "plugin") {
        UpdateOutcome::Ok => (StatusCode::OK, Json(ApiResponse::ok())),
        UpdateOutcome::Ignored(reason) => (StatusCode::OK, Json(ApiResponse::ignored(reason))),
        UpdateOutcome::NotFound => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Task not found")),
        ),
        UpdateOutcome::InvalidStatus(status) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(&format!("Invalid status '{}'", status))),
        ),
    }
}

async fn deleteTask(
    State(state): State<Arc<FeedState>>,
    Json(req): Json<DeleteTaskRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if state.deleteTask(&req.task_id) {
        (StatusCode::OK, Json(ApiResponse::ok()))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Task not found")),
        )
    }
}

async fn resetTasks(
    State(state): State<Arc<FeedState>>,
    Json(req): Json<ResetRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    state.resetTasks(req.task_id.as_deref());
    (StatusCode::OK, Json(ApiResponse::ok()))
}

// ============================================
// SERVER STARTUP
// ============================================

pub fn createApp(state: Arc<FeedState>) -> Router {
    Router::new()
        .route("/api/status", get(getStatus))
        .route("/api/task/report", post(reportTask))
        .route("/api/task/update_state", post(updateState))
        .route("/api/task/delete", post(deleteTask))
        .route("/api/reset", post(resetTasks))
        .with_state(state)
}

pub async fn startServer(
    state: Arc<FeedState>,
    host: String,
    port: u16,
    cancel: CancellationToken,
) -> Result<(), String> {
    let app = createApp(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("failed to bind {}: {}", addr, e))?;
    info!(%addr, "status feed server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "status feed server error");
            e.to_string()
        })
}
