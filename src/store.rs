// In-memory store for Vibebar: task collection, current selection, history
// log, and user settings. Settings and history persist to ~/.vibebar/config.md
// as YAML frontmatter plus a markdown table; tasks are runtime state rebuilt
// from the status feed.

use parking_lot::RwLock;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::commands::common::{clampProgress, newId, now};
use crate::models::{
    Adapter, CustomColors, FeedTask, HistoryEntry, Settings, SettingsUpdate, Task, TaskStatus,
    config::{clampOpacity, clampPort, clampThreshold, clampVolume},
};

/// History keeps the 50 most recent completions
pub const HISTORY_LIMIT: usize = 50;

// ============================================
// PATH HELPERS
// ============================================

/// Config directory (~/.vibebar/)
pub fn configDir() -> PathBuf {
    let home = dirs::home_dir().expect("Failed to get home directory");
    home.join(".vibebar")
}

/// Config file path
pub fn defaultConfigPath() -> PathBuf {
    configDir().join("config.md")
}

// ============================================
// FRONTMATTER PARSING
// ============================================

/// Parse YAML frontmatter from markdown content
pub fn parseFrontmatter<T: serde::de::DeserializeOwned>(content: &str) -> Option<(T, String)> {
    let content = content.trim();
    if !content.starts_with("---") {
        return None;
    }

    let rest = &content[3..];
    let end = rest.find("\n---")?;
    let yaml = &rest[..end].trim();
    let body = rest[end + 4..].trim().to_string();

    let frontmatter: T = serde_yaml::from_str(yaml).ok()?;
    Some((frontmatter, body))
}

/// Serialize frontmatter + body to markdown
pub fn toMarkdown<T: serde::Serialize>(frontmatter: &T, body: &str) -> Result<String, String> {
    let yaml = serde_yaml::to_string(frontmatter)
        .map_err(|e| format!("YAML error: {}", e))?;
    Ok(format!("---\n{}---\n\n{}", yaml, body))
}

// ============================================
// EVENTS
// ============================================

/// Published after every mutation. Completion and error events carry the task
/// snapshot taken at transition time, so a subscriber never has to re-read
/// state that may have moved on.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    TaskAdded { id: String },
    TaskRemoved { id: String },
    TaskReset { id: String },
    ProgressChanged { id: String, from: u32, to: u32 },
    TokensChanged { id: String, tokens: u64 },
    TaskCompleted { task: Task },
    TaskErrored { task: Task },
    SelectionChanged { id: Option<String> },
    SettingsChanged,
}

type Subscriber = Box<dyn Fn(&StoreEvent) + Send + Sync>;

// ============================================
// STORE
// ============================================

pub struct Store {
    pub tasks: RwLock<Vec<Task>>,
    pub currentTaskId: RwLock<Option<String>>,
    pub history: RwLock<Vec<HistoryEntry>>,
    pub settings: RwLock<Settings>,
    configPath: PathBuf,
    subscribers: RwLock<Vec<Subscriber>>,
}

pub type StoreState = Arc<Store>;

/// Initialize the store, loading settings and history from disk
pub fn initStore() -> StoreState {
    Arc::new(Store::new(defaultConfigPath()))
}

impl Store {
    pub fn new(configPath: PathBuf) -> Self {
        let (settings, history) = loadConfig(&configPath);
        info!(path = %configPath.display(), historyEntries = history.len(), "store initialized");

        Self {
            tasks: RwLock::new(Vec::new()),
            currentTaskId: RwLock::new(None),
            history: RwLock::new(history),
            settings: RwLock::new(settings),
            configPath,
            subscribers: RwLock::new(Vec::new()),
        }
    }

    // ----- observers -----

    pub fn subscribe(&self, f: impl Fn(&StoreEvent) + Send + Sync + 'static) {
        self.subscribers.write().push(Box::new(f));
    }

    /// Deliver events to subscribers. Callers must have released their write
    /// locks first; handlers are allowed to mutate the store.
    fn publish(&self, events: Vec<StoreEvent>) {
        if events.is_empty() {
            return;
        }
        let subscribers = self.subscribers.read();
        for event in &events {
            for subscriber in subscribers.iter() {
                subscriber(event);
            }
        }
    }

    // ----- task operations -----

    /// Create a task in idle state and select it. Always succeeds.
    pub fn addTask(
        &self,
        name: String,
        adapter: Option<Adapter>,
        ide: Option<String>,
        windowTitle: Option<String>,
    ) -> String {
        let id = newId();
        let task = Task::new(id.clone(), name, adapter, ide, windowTitle);
        self.tasks.write().push(task);
        *self.currentTaskId.write() = Some(id.clone());
        self.publish(vec![StoreEvent::TaskAdded { id: id.clone() }]);
        id
    }

    /// Remove a task if present; clears the selection when it pointed here
    pub fn removeTask(&self, id: &str) {
        let removed = {
            let mut tasks = self.tasks.write();
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            before != tasks.len()
        };
        if !removed {
            return;
        }
        {
            let mut current = self.currentTaskId.write();
            if current.as_deref() == Some(id) {
                *current = None;
            }
        }
        self.publish(vec![StoreEvent::TaskRemoved { id: id.to_string() }]);
    }

    /// Set the selection. The id is not validated; a dangling selection
    /// resolves to "no current task".
    pub fn setCurrentTask(&self, id: Option<String>) {
        *self.currentTaskId.write() = id.clone();
        self.publish(vec![StoreEvent::SelectionChanged { id }]);
    }

    pub fn currentTask(&self) -> Option<Task> {
        let current = self.currentTaskId.read();
        let id = current.as_deref()?;
        self.tasks.read().iter().find(|t| t.id == id).cloned()
    }

    pub fn getTasks(&self) -> Vec<Task> {
        self.tasks.read().clone()
    }

    pub fn getTask(&self, id: &str) -> Option<Task> {
        self.tasks.read().iter().find(|t| t.id == id).cloned()
    }

    /// Clamp and store a progress value. No-op on unknown ids.
    pub fn updateProgress(&self, id: &str, value: i64) {
        let mut events = Vec::new();
        {
            let mut tasks = self.tasks.write();
            if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
                let from = task.progress;
                task.progress = clampProgress(value);
                if task.progress != from {
                    events.push(StoreEvent::ProgressChanged {
                        id: id.to_string(),
                        from,
                        to: task.progress,
                    });
                }
            }
        }
        self.publish(events);
    }

    /// Set or increment the token counter. No-op on unknown ids.
    pub fn updateTokens(&self, id: &str, amount: u64, increment: bool) {
        let mut events = Vec::new();
        {
            let mut tasks = self.tasks.write();
            if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
                task.tokens = if increment {
                    task.tokens.saturating_add(amount)
                } else {
                    amount
                };
                events.push(StoreEvent::TokensChanged {
                    id: id.to_string(),
                    tokens: task.tokens,
                });
            }
        }
        self.publish(events);
    }

    /// Set the status. Entering completed/error stamps endTime once; repeating
    /// the same terminal status neither re-stamps nor re-fires events.
    pub fn updateStatus(&self, id: &str, status: TaskStatus) {
        let mut events = Vec::new();
        {
            let mut tasks = self.tasks.write();
            if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
                let old = task.status;
                task.status = status;
                if status.isTerminal() && task.endTime.is_none() {
                    task.endTime = Some(now());
                }
                if status == TaskStatus::Completed && old != TaskStatus::Completed {
                    events.push(StoreEvent::TaskCompleted { task: task.clone() });
                }
                if status == TaskStatus::Error && old != TaskStatus::Error {
                    events.push(StoreEvent::TaskErrored { task: task.clone() });
                }
            }
        }
        self.publish(events);
    }

    /// Mark a task finished: progress 100, completed, endTime stamped, and the
    /// final token count when the caller knows it
    pub fn completeTask(&self, id: &str, totalTokens: Option<u64>) {
        let mut events = Vec::new();
        {
            let mut tasks = self.tasks.write();
            if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
                let old = task.status;
                task.progress = 100;
                task.status = TaskStatus::Completed;
                if let Some(tokens) = totalTokens {
                    task.tokens = tokens;
                }
                if task.endTime.is_none() {
                    task.endTime = Some(now());
                }
                if old != TaskStatus::Completed {
                    events.push(StoreEvent::TaskCompleted { task: task.clone() });
                }
            }
        }
        self.publish(events);
    }

    /// Put a task back to its initial state. This is the only operation that
    /// un-terminates a completed or errored task.
    pub fn resetTask(&self, id: &str) {
        let mut events = Vec::new();
        {
            let mut tasks = self.tasks.write();
            if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
                task.progress = 0;
                task.tokens = 0;
                task.status = TaskStatus::Idle;
                task.startTime = now();
                task.endTime = None;
                events.push(StoreEvent::TaskReset { id: id.to_string() });
            }
        }
        self.publish(events);
    }

    // ----- history -----

    /// Record a frozen snapshot, most recent first, capped at HISTORY_LIMIT
    pub fn addToHistory(&self, task: &Task) {
        {
            let mut history = self.history.write();
            history.insert(0, HistoryEntry::from(task));
            history.truncate(HISTORY_LIMIT);
        }
        self.schedulePersist();
    }

    pub fn getHistory(&self) -> Vec<HistoryEntry> {
        self.history.read().clone()
    }

    pub fn clearHistory(&self) {
        self.history.write().clear();
        self.schedulePersist();
    }

    /// Replace the whole log (config import), keeping the cap
    pub fn replaceHistory(&self, entries: Vec<HistoryEntry>) {
        {
            let mut history = self.history.write();
            *history = entries;
            history.truncate(HISTORY_LIMIT);
        }
        self.schedulePersist();
    }

    // ----- settings -----

    pub fn getSettings(&self) -> Settings {
        self.settings.read().clone()
    }

    fn mutateSettings(&self, f: impl FnOnce(&mut Settings)) {
        {
            let mut settings = self.settings.write();
            f(&mut settings);
        }
        self.publish(vec![StoreEvent::SettingsChanged]);
        self.schedulePersist();
    }

    pub fn setLanguage(&self, language: String) {
        self.mutateSettings(|s| s.language = language);
    }

    pub fn setTheme(&self, theme: String) {
        self.mutateSettings(|s| s.theme = theme);
    }

    pub fn setFontSize(&self, fontSize: i32) {
        self.mutateSettings(|s| s.fontSize = fontSize);
    }

    pub fn setOpacity(&self, opacity: f64) {
        self.mutateSettings(|s| s.opacity = clampOpacity(opacity));
    }

    pub fn setAlwaysOnTop(&self, value: bool) {
        self.mutateSettings(|s| s.alwaysOnTop = value);
    }

    pub fn setAutoStart(&self, value: bool) {
        self.mutateSettings(|s| s.autoStart = value);
    }

    pub fn setNotifications(&self, value: bool) {
        self.mutateSettings(|s| s.notifications = value);
    }

    pub fn setSound(&self, value: bool) {
        self.mutateSettings(|s| s.sound = value);
    }

    pub fn setSoundVolume(&self, volume: f64) {
        self.mutateSettings(|s| s.soundVolume = clampVolume(volume));
    }

    pub fn setHttpHost(&self, host: String) {
        self.mutateSettings(|s| s.httpHost = host);
    }

    pub fn setHttpPort(&self, port: u32) {
        self.mutateSettings(|s| s.httpPort = clampPort(port));
    }

    pub fn setCustomColors(&self, colors: CustomColors) {
        self.mutateSettings(|s| s.customColors = colors);
    }

    pub fn setReminderThreshold(&self, threshold: u32) {
        self.mutateSettings(|s| s.reminderThreshold = clampThreshold(threshold));
    }

    pub fn setDoNotDisturb(&self, value: bool) {
        self.mutateSettings(|s| s.doNotDisturb = value);
    }

    pub fn setDoNotDisturbStart(&self, start: String) {
        self.mutateSettings(|s| s.doNotDisturbStart = start);
    }

    pub fn setDoNotDisturbEnd(&self, end: String) {
        self.mutateSettings(|s| s.doNotDisturbEnd = end);
    }

    pub fn setWindowVisible(&self, visible: bool) {
        self.mutateSettings(|s| s.windowVisible = visible);
    }

    /// Merge a partial update in one pass, clamping field by field
    pub fn applySettingsUpdate(&self, update: &SettingsUpdate) {
        self.mutateSettings(|s| s.apply(update));
    }

    // ----- feed merge -----

    /// Reconcile one polled feed payload. External records only add or update;
    /// tasks absent from the feed are kept (removal is a local user action).
    /// Applying the same payload twice produces the same state and no extra
    /// events.
    pub fn applyFeed(&self, records: Vec<FeedTask>, currentTask: Option<String>) {
        let mut events = Vec::new();
        {
            let mut tasks = self.tasks.write();
            for rec in records {
                if let Some(task) = tasks.iter_mut().find(|t| t.id == rec.id) {
                    let oldStatus = task.status;
                    let oldProgress = task.progress;

                    task.name = rec.name;
                    task.progress = rec.progress.min(100);
                    if let Some(tokens) = rec.tokens {
                        task.tokens = tokens;
                    }
                    task.status = rec.status;
                    // the feed may not know the real start; keep ours then
                    if rec.start_time > 0 {
                        task.startTime = rec.start_time;
                    }
                    if rec.end_time.is_some() {
                        task.endTime = rec.end_time;
                    }
                    // single point guaranteeing every completed task has an end
                    if task.status == TaskStatus::Completed && task.endTime.is_none() {
                        task.endTime = Some(now());
                    }
                    if let Some(adapter) = rec.adapter.as_deref().and_then(Adapter::fromId) {
                        task.adapter = Some(adapter);
                    }
                    if rec.ide.is_some() {
                        task.ide = rec.ide;
                    }
                    if rec.window_title.is_some() {
                        task.windowTitle = rec.window_title;
                    }
                    if rec.project_path.is_some() {
                        task.projectPath = rec.project_path;
                    }
                    if rec.active_file.is_some() {
                        task.activeFile = rec.active_file;
                    }

                    if task.progress != oldProgress {
                        events.push(StoreEvent::ProgressChanged {
                            id: task.id.clone(),
                            from: oldProgress,
                            to: task.progress,
                        });
                    }
                    if task.status == TaskStatus::Completed && oldStatus != TaskStatus::Completed {
                        events.push(StoreEvent::TaskCompleted { task: task.clone() });
                    }
                    if task.status == TaskStatus::Error && oldStatus != TaskStatus::Error {
                        events.push(StoreEvent::TaskErrored { task: task.clone() });
                    }
                } else {
                    debug!(task_id = %rec.id, "feed reported unknown task, inserting");
                    let mut task = Task {
                        id: rec.id.clone(),
                        name: rec.name,
                        progress: rec.progress.min(100),
                        tokens: rec.tokens.unwrap_or(0),
                        status: rec.status,
                        startTime: rec.start_time,
                        endTime: rec.end_time,
                        adapter: rec.adapter.as_deref().and_then(Adapter::fromId),
                        ide: rec.ide,
                        windowTitle: rec.window_title,
                        projectPath: rec.project_path,
                        activeFile: rec.active_file,
                    };
                    if task.status == TaskStatus::Completed && task.endTime.is_none() {
                        task.endTime = Some(now());
                    }
                    events.push(StoreEvent::TaskAdded { id: task.id.clone() });
                    tasks.push(task);
                }
            }
        }
        if let Some(id) = currentTask {
            *self.currentTaskId.write() = Some(id);
        }
        self.publish(events);
    }

    // ----- persistence -----

    /// Write settings + history now. Used by the persist thread and tests.
    pub fn persistNow(&self) -> Result<(), String> {
        let settings = self.settings.read().clone();
        let history = self.history.read().clone();
        writeConfig(&self.configPath, &settings, &history)
    }

    /// Fire-and-forget persist; a slow or failing disk never blocks a caller
    fn schedulePersist(&self) {
        let settings = self.settings.read().clone();
        let history = self.history.read().clone();
        let path = self.configPath.clone();
        std::thread::spawn(move || {
            if let Err(e) = writeConfig(&path, &settings, &history) {
                error!(path = %path.display(), error = %e, "failed to persist config");
            }
        });
    }
}

// ============================================
// CONFIG FILE
// ============================================

fn loadConfig(path: &Path) -> (Settings, Vec<HistoryEntry>) {
    if !path.exists() {
        info!(path = %path.display(), "no config file, using defaults");
        return (Settings::default(), Vec::new());
    }

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
            return (Settings::default(), Vec::new());
        }
    };

    match parseFrontmatter::<Settings>(&content) {
        Some((settings, body)) => {
            let history = parseHistoryTable(&body);
            (settings, history)
        }
        None => {
            warn!(path = %path.display(), "failed to parse config frontmatter, using defaults");
            (Settings::default(), Vec::new())
        }
    }
}

fn writeConfig(path: &Path, settings: &Settings, history: &[HistoryEntry]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    let content = toMarkdown(settings, &buildHistoryTable(history))?;
    fs::write(path, content).map_err(|e| e.to_string())
}

fn buildHistoryTable(history: &[HistoryEntry]) -> String {
    let mut body = String::from(
        "# History\n\n| id | name | status | progress | tokens | started | ended | adapter | ide |\n|----|------|--------|----------|--------|---------|-------|---------|-----|\n",
    );
    for entry in history {
        body.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            entry.id,
            if entry.name.is_empty() { "-" } else { &entry.name },
            entry.status.asStr(),
            entry.progress,
            entry.tokens,
            entry.startTime,
            entry.endTime.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string()),
            entry.adapter.map(|a| a.id()).unwrap_or("-"),
            entry.ide.as_deref().unwrap_or("-"),
        ));
    }
    body
}

/// Parse the history table from the config body. A row that does not parse
/// is dropped, not an error.
fn parseHistoryTable(body: &str) -> Vec<HistoryEntry> {
    let mut history = Vec::new();

    for line in body.lines() {
        let line = line.trim();
        // Skip header rows and empty lines
        if line.is_empty() || line.starts_with('#') || line.starts_with("|--") || line.contains("started") {
            continue;
        }
        if !line.starts_with('|') {
            continue;
        }
        let parts: Vec<&str> = line
            .split('|')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() < 9 {
            continue;
        }

        let Some(status) = TaskStatus::parse(parts[2]) else {
            continue;
        };
        let Ok(progress) = parts[3].parse::<u32>() else {
            continue;
        };
        let Ok(startTime) = parts[5].parse::<i64>() else {
            continue;
        };

        history.push(HistoryEntry {
            id: parts[0].to_string(),
            name: if parts[1] == "-" { String::new() } else { parts[1].to_string() },
            status,
            progress: progress.min(100),
            tokens: parts[4].parse::<u64>().unwrap_or(0),
            startTime,
            endTime: if parts[6] == "-" { None } else { parts[6].parse::<i64>().ok() },
            adapter: if parts[7] == "-" { None } else { Adapter::fromId(parts[7]) },
            ide: if parts[8] == "-" { None } else { Some(parts[8].to_string()) },
        });
    }

    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn testStore() -> Store {
        Store::new(std::env::temp_dir().join(format!("vibebar-test-{}.md", newId())))
    }

    fn feedTask(id: &str, status: TaskStatus) -> FeedTask {
        FeedTask {
            id: id.to_string(),
            name: format!("Task {}", id),
            progress: 0,
            tokens: None,
            status,
            start_time: 0,
            end_time: None,
            adapter: None,
            ide: None,
            window_title: None,
            project_path: None,
            active_file: None,
        }
    }

    #[test]
    fn test_add_task_selects_it() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);

        let current = store.currentTask().unwrap();
        assert_eq!(current.id, id);
        assert_eq!(current.name, "X");
        assert_eq!(current.progress, 0);
        assert_eq!(current.tokens, 0);
        assert_eq!(current.status, TaskStatus::Idle);
    }

    #[test]
    fn test_remove_current_task_clears_selection() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);
        store.removeTask(&id);

        assert!(store.getTasks().is_empty());
        assert!(store.currentTask().is_none());
        assert!(store.currentTaskId.read().is_none());
    }

    #[test]
    fn test_remove_other_task_keeps_selection() {
        let store = testStore();
        let first = store.addTask("A".into(), None, None, None);
        let second = store.addTask("B".into(), None, None, None);
        store.removeTask(&first);

        assert_eq!(store.currentTaskId.read().as_deref(), Some(second.as_str()));
        store.removeTask("no-such-id"); // no-op
        assert_eq!(store.getTasks().len(), 1);
    }

    #[test]
    fn test_dangling_selection_resolves_to_none() {
        let store = testStore();
        store.setCurrentTask(Some("gone".into()));
        assert!(store.currentTask().is_none());
    }

    #[test]
    fn test_update_progress_clamps() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);

        store.updateProgress(&id, 150);
        assert_eq!(store.getTask(&id).unwrap().progress, 100);

        store.updateProgress(&id, -10);
        assert_eq!(store.getTask(&id).unwrap().progress, 0);

        store.updateProgress("unknown", 50); // no-op
        assert_eq!(store.getTasks().len(), 1);
    }

    #[test]
    fn test_update_tokens_absolute_and_increment() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);

        store.updateTokens(&id, 100, false);
        assert_eq!(store.getTask(&id).unwrap().tokens, 100);

        store.updateTokens(&id, 50, true);
        assert_eq!(store.getTask(&id).unwrap().tokens, 150);

        store.updateTokens(&id, 200, false);
        assert_eq!(store.getTask(&id).unwrap().tokens, 200);
    }

    #[test]
    fn test_update_status_stamps_end_time_once() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);

        store.updateStatus(&id, TaskStatus::Completed);
        let first = store.getTask(&id).unwrap().endTime.unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        store.updateStatus(&id, TaskStatus::Completed);
        assert_eq!(store.getTask(&id).unwrap().endTime, Some(first));
    }

    #[test]
    fn test_update_status_error_stamps_end_time() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);
        store.updateStatus(&id, TaskStatus::Error);
        assert!(store.getTask(&id).unwrap().endTime.is_some());
    }

    #[test]
    fn test_complete_task() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);
        store.completeTask(&id, Some(500));

        let task = store.getTask(&id).unwrap();
        assert_eq!(task.progress, 100);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.tokens, 500);
        assert!(task.endTime.unwrap() >= task.startTime);
    }

    #[test]
    fn test_reset_after_complete() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);
        let before = store.getTask(&id).unwrap().startTime;
        store.completeTask(&id, Some(500));

        store.resetTask(&id);
        let task = store.getTask(&id).unwrap();
        assert_eq!(task.progress, 0);
        assert_eq!(task.tokens, 0);
        assert_eq!(task.status, TaskStatus::Idle);
        assert!(task.endTime.is_none());
        assert!(task.startTime >= before);
    }

    #[test]
    fn test_complete_emits_once() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);

        let completions = Arc::new(AtomicUsize::new(0));
        let counter = completions.clone();
        store.subscribe(move |event| {
            if matches!(event, StoreEvent::TaskCompleted { .. }) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        store.completeTask(&id, None);
        store.completeTask(&id, None);
        store.updateStatus(&id, TaskStatus::Completed);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_history_cap_and_order() {
        let store = testStore();
        for i in 0..60 {
            let mut task = Task::new(format!("task-{}", i), format!("Task {}", i), None, None, None);
            task.status = TaskStatus::Completed;
            store.addToHistory(&task);
        }

        let history = store.getHistory();
        assert_eq!(history.len(), HISTORY_LIMIT);
        // most recent first
        assert_eq!(history[0].name, "Task 59");
        assert_eq!(history[49].name, "Task 10");

        store.clearHistory();
        assert!(store.getHistory().is_empty());
    }

    #[test]
    fn test_settings_setters_clamp() {
        let store = testStore();

        store.setOpacity(1.5);
        assert_eq!(store.getSettings().opacity, 1.0);
        store.setOpacity(0.05);
        assert_eq!(store.getSettings().opacity, 0.1);

        store.setSoundVolume(1.5);
        assert_eq!(store.getSettings().soundVolume, 1.0);
        store.setSoundVolume(-0.5);
        assert_eq!(store.getSettings().soundVolume, 0.0);

        store.setHttpPort(80);
        assert_eq!(store.getSettings().httpPort, 1024);
        store.setHttpPort(70000);
        assert_eq!(store.getSettings().httpPort, 65535);

        store.setReminderThreshold(150);
        assert_eq!(store.getSettings().reminderThreshold, 100);
    }

    #[test]
    fn test_apply_feed_inserts_unknown_tasks() {
        let store = testStore();
        let mut rec = feedTask("ext-1", TaskStatus::Running);
        rec.progress = 40;
        rec.tokens = Some(1200);
        rec.ide = Some("cursor".into());
        store.applyFeed(vec![rec], None);

        let task = store.getTask("ext-1").unwrap();
        assert_eq!(task.progress, 40);
        assert_eq!(task.tokens, 1200);
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.ide.as_deref(), Some("cursor"));
    }

    #[test]
    fn test_apply_feed_preserves_local_start_time() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);
        let localStart = store.getTask(&id).unwrap().startTime;

        let mut rec = feedTask(&id, TaskStatus::Running);
        rec.start_time = 0; // feed does not know the real start
        store.applyFeed(vec![rec], None);
        assert_eq!(store.getTask(&id).unwrap().startTime, localStart);

        let mut rec = feedTask(&id, TaskStatus::Running);
        rec.start_time = 42;
        store.applyFeed(vec![rec], None);
        assert_eq!(store.getTask(&id).unwrap().startTime, 42);
    }

    #[test]
    fn test_apply_feed_preserves_local_end_time() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);
        store.completeTask(&id, None);
        let localEnd = store.getTask(&id).unwrap().endTime;

        let rec = feedTask(&id, TaskStatus::Completed);
        store.applyFeed(vec![rec], None);
        assert_eq!(store.getTask(&id).unwrap().endTime, localEnd);
    }

    #[test]
    fn test_apply_feed_stamps_end_time_for_completed() {
        let store = testStore();
        let rec = feedTask("ext-1", TaskStatus::Completed);
        store.applyFeed(vec![rec], None);
        assert!(store.getTask("ext-1").unwrap().endTime.is_some());
    }

    #[test]
    fn test_apply_feed_keeps_token_count_when_feed_omits_it() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);
        store.updateTokens(&id, 900, false);

        let rec = feedTask(&id, TaskStatus::Running);
        store.applyFeed(vec![rec], None);
        assert_eq!(store.getTask(&id).unwrap().tokens, 900);
    }

    #[test]
    fn test_apply_feed_idempotent() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);

        let completions = Arc::new(AtomicUsize::new(0));
        let counter = completions.clone();
        store.subscribe(move |event| {
            if matches!(event, StoreEvent::TaskCompleted { .. }) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let mut rec = feedTask(&id, TaskStatus::Completed);
        rec.progress = 100;
        store.applyFeed(vec![rec.clone()], None);
        let afterFirst = store.getTask(&id).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        store.applyFeed(vec![rec], None);
        let afterSecond = store.getTask(&id).unwrap();

        assert_eq!(store.getTasks().len(), 1);
        assert_eq!(afterFirst.endTime, afterSecond.endTime);
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_apply_feed_adopts_current_task() {
        let store = testStore();
        let local = store.addTask("local".into(), None, None, None);

        store.applyFeed(vec![feedTask("ext-1", TaskStatus::Armed)], Some("ext-1".into()));
        assert_eq!(store.currentTaskId.read().as_deref(), Some("ext-1"));

        // no current in the feed leaves the selection untouched
        store.setCurrentTask(Some(local.clone()));
        store.applyFeed(vec![feedTask("ext-1", TaskStatus::Armed)], None);
        assert_eq!(store.currentTaskId.read().as_deref(), Some(local.as_str()));
    }

    #[test]
    fn test_apply_feed_never_removes_local_tasks() {
        let store = testStore();
        store.addTask("local only".into(), None, None, None);
        store.applyFeed(vec![feedTask("ext-1", TaskStatus::Armed)], None);
        assert_eq!(store.getTasks().len(), 2);
    }

    #[test]
    fn test_events_are_published_in_order() {
        let store = testStore();
        let id = store.addTask("X".into(), None, None, None);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |event| {
            sink.lock().unwrap().push(format!("{:?}", event).split(' ').next().unwrap().to_string());
        });

        store.updateProgress(&id, 50);
        store.completeTask(&id, None);
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], "ProgressChanged");
        assert_eq!(seen[1], "TaskCompleted");
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.md");

        let store = Store::new(path.clone());
        // mutate through the locks directly so no background persist thread
        // races the synchronous write below
        {
            let mut settings = store.settings.write();
            settings.theme = "ocean".into();
            settings.httpPort = 8080;
        }
        let mut task = Task::new("t1".into(), "Write docs".into(), Some(Adapter::ClaudeCode), Some("cursor".into()), None);
        task.status = TaskStatus::Completed;
        task.progress = 100;
        task.tokens = 4321;
        task.endTime = Some(task.startTime + 60_000);
        store.history.write().insert(0, HistoryEntry::from(&task));
        store.persistNow().unwrap();

        let reloaded = Store::new(path);
        assert_eq!(reloaded.getSettings().theme, "ocean");
        assert_eq!(reloaded.getSettings().httpPort, 8080);
        let history = reloaded.getHistory();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "Write docs");
        assert_eq!(history[0].tokens, 4321);
        assert_eq!(history[0].adapter, Some(Adapter::ClaudeCode));
        assert_eq!(history[0].endTime, Some(task.startTime + 60_000));
    }

    #[test]
    fn test_load_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.md");
        fs::write(&path, "not a config file at all").unwrap();

        let store = Store::new(path);
        assert_eq!(store.getSettings().theme, "dark");
        assert!(store.getHistory().is_empty());
    }
}
