// Notification dispatcher
// Translates task lifecycle events into desktop alerts and sounds, gated by
// the do-not-disturb window. History recording happens here too, so every
// completion is logged whether or not alerts are enabled.

use chrono::{Local, NaiveTime, Timelike};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{Settings, task::formatDuration};
use crate::store::{StoreEvent, StoreState};

/// Volume scale for threshold reminders
const REMINDER_VOLUME_SCALE: f64 = 0.5;
/// Volume scale for error alerts
const ERROR_VOLUME_SCALE: f64 = 0.3;

// ============================================
// ALERT SINK
// ============================================

/// Where alerts go. The real sink talks to the OS notification center and
/// tells the webview to play a sound; tests record calls instead.
pub trait AlertSink: Send + Sync {
    fn notify(&self, title: &str, body: &str);
    fn playSound(&self, volume: f64);
}

pub struct TauriAlertSink {
    app: tauri::AppHandle,
}

impl TauriAlertSink {
    pub fn new(app: tauri::AppHandle) -> Self {
        Self { app }
    }
}

impl AlertSink for TauriAlertSink {
    fn notify(&self, title: &str, body: &str) {
        use tauri_plugin_notification::NotificationExt;
        if let Err(e) = self
            .app
            .notification()
            .builder()
            .title(title)
            .body(body)
            .show()
        {
            warn!(error = %e, "failed to show desktop notification");
        }
    }

    fn playSound(&self, volume: f64) {
        // Audio playback lives in the webview; just hand it the volume
        use tauri::Emitter;
        if let Err(e) = self.app.emit("play-sound", volume) {
            warn!(error = %e, "failed to emit play-sound event");
        }
    }
}

// ============================================
// QUIET HOURS
// ============================================

/// Whether `now` falls inside the window. A window whose start is after its
/// end spans midnight (e.g. 22:00 - 08:00).
pub fn isInDoNotDisturb(start: &str, end: &str, now: NaiveTime) -> bool {
    let parse = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").ok();
    let (Some(start), Some(end)) = (parse(start), parse(end)) else {
        warn!(start, end, "unparseable do-not-disturb window, treating as inactive");
        return false;
    };
    // compare at minute granularity, like the HH:MM strings being configured
    let now = NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(now);

    if start <= end {
        start <= now && now <= end
    } else {
        now >= start || now <= end
    }
}

fn quietHoursActive(settings: &Settings) -> bool {
    settings.doNotDisturb
        && isInDoNotDisturb(
            &settings.doNotDisturbStart,
            &settings.doNotDisturbEnd,
            Local::now().time(),
        )
}

// ============================================
// DISPATCHER
// ============================================

pub struct Dispatcher {
    store: StoreState,
    sink: Arc<dyn AlertSink>,
}

impl Dispatcher {
    /// Build a dispatcher and subscribe it to the store
    pub fn attach(store: StoreState, sink: Arc<dyn AlertSink>) {
        let dispatcher = Arc::new(Self {
            store: store.clone(),
            sink,
        });
        store.subscribe(move |event| dispatcher.handle(event));
    }

    pub fn handle(&self, event: &StoreEvent) {
        match event {
            StoreEvent::TaskCompleted { task } => {
                // history records every completion, alerts or not
                self.store.addToHistory(task);

                let settings = self.store.getSettings();
                if quietHoursActive(&settings) {
                    debug!(task_id = %task.id, "completion inside quiet hours, alert suppressed");
                    return;
                }
                if settings.notifications {
                    let mut body = task.name.clone();
                    if let Some(adapter) = task.adapter {
                        body.push_str(&format!(" · {}", adapter.label()));
                    }
                    if let Some(duration) = task.durationMillis() {
                        body.push_str(&format!(" · {}", formatDuration(duration)));
                    }
                    if task.tokens > 0 {
                        body.push_str(&format!(" · {} tokens", task.tokens));
                    }
                    self.sink.notify("Task completed", &body);
                }
                if settings.sound {
                    self.sink.playSound(settings.soundVolume);
                }
            }
            StoreEvent::TaskErrored { task } => {
                let settings = self.store.getSettings();
                if quietHoursActive(&settings) {
                    return;
                }
                if settings.notifications {
                    self.sink.notify("Task failed", &task.name);
                }
                if settings.sound {
                    self.sink.playSound(settings.soundVolume * ERROR_VOLUME_SCALE);
                }
            }
            StoreEvent::ProgressChanged { id, from, to } => {
                let settings = self.store.getSettings();
                let threshold = settings.reminderThreshold;
                // edge-triggered: fire only when crossing from below
                if !(*from < threshold && *to >= threshold) {
                    return;
                }
                if quietHoursActive(&settings) {
                    return;
                }
                if settings.notifications {
                    if let Some(task) = self.store.getTask(id) {
                        self.sink
                            .notify("Almost there", &format!("{} is at {}%", task.name, to));
                    }
                }
                if settings.sound {
                    self.sink
                        .playSound(settings.soundVolume * REMINDER_VOLUME_SCALE);
                }
            }
            _ => {}
        }
    }
}
