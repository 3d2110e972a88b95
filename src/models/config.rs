// Configuration models for Vibebar
// Settings record with clamped numeric ranges, plus the portable config document

use serde::{Deserialize, Serialize};

use super::history::HistoryEntry;

/// User preferences. Every numeric setter clamps into the documented range,
/// so a Settings value read from the store is always in-range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub language: String,
    pub theme: String,
    pub fontSize: i32,
    /// 0.1 - 1.0
    pub opacity: f64,
    pub alwaysOnTop: bool,
    pub autoStart: bool,
    pub notifications: bool,
    pub sound: bool,
    /// 0.0 - 1.0
    pub soundVolume: f64,
    pub httpHost: String,
    /// 1024 - 65535
    pub httpPort: u16,
    #[serde(default)]
    pub customColors: CustomColors,
    /// 0 - 100; progress crossing this from below triggers a reminder
    pub reminderThreshold: u32,
    pub doNotDisturb: bool,
    pub doNotDisturbStart: String,
    pub doNotDisturbEnd: String,
    pub windowVisible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomColors {
    #[serde(default)]
    pub primaryColor: String,
    #[serde(default)]
    pub backgroundColor: String,
    #[serde(default)]
    pub textColor: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            theme: "dark".to_string(),
            fontSize: 14,
            opacity: 0.85,
            alwaysOnTop: true,
            autoStart: false,
            notifications: true,
            sound: true,
            soundVolume: 0.7,
            httpHost: "127.0.0.1".to_string(),
            httpPort: 31415,
            customColors: CustomColors::default(),
            reminderThreshold: 100,
            doNotDisturb: false,
            doNotDisturbStart: "22:00".to_string(),
            doNotDisturbEnd: "08:00".to_string(),
            windowVisible: true,
        }
    }
}

pub fn clampOpacity(value: f64) -> f64 {
    value.clamp(0.1, 1.0)
}

pub fn clampVolume(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

pub fn clampPort(value: u32) -> u16 {
    value.clamp(1024, 65535) as u16
}

pub fn clampThreshold(value: u32) -> u32 {
    value.min(100)
}

/// Partial settings update (all fields optional). Used by the updateSettings
/// command and by config import, which applies only the fields present.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fontSize: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alwaysOnTop: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoStart: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soundVolume: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub httpHost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub httpPort: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customColors: Option<CustomColors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminderThreshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doNotDisturb: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doNotDisturbStart: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doNotDisturbEnd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windowVisible: Option<bool>,
}

impl SettingsUpdate {
    /// Extract an update from untyped JSON, field by field. A field with the
    /// wrong type is treated as absent; it never fails the whole document.
    pub fn fromJson(value: &serde_json::Value) -> Self {
        Self {
            language: value.get("language").and_then(|v| v.as_str()).map(String::from),
            theme: value.get("theme").and_then(|v| v.as_str()).map(String::from),
            fontSize: value.get("fontSize").and_then(|v| v.as_i64()).map(|v| v as i32),
            opacity: value.get("opacity").and_then(|v| v.as_f64()),
            alwaysOnTop: value.get("alwaysOnTop").and_then(|v| v.as_bool()),
            autoStart: value.get("autoStart").and_then(|v| v.as_bool()),
            notifications: value.get("notifications").and_then(|v| v.as_bool()),
            sound: value.get("sound").and_then(|v| v.as_bool()),
            soundVolume: value.get("soundVolume").and_then(|v| v.as_f64()),
            httpHost: value.get("httpHost").and_then(|v| v.as_str()).map(String::from),
            httpPort: value.get("httpPort").and_then(|v| v.as_u64()).map(|v| v.min(u32::MAX as u64) as u32),
            customColors: value
                .get("customColors")
                .and_then(|v| serde_json::from_value(v.clone()).ok()),
            reminderThreshold: value
                .get("reminderThreshold")
                .and_then(|v| v.as_u64())
                .map(|v| v.min(u32::MAX as u64) as u32),
            doNotDisturb: value.get("doNotDisturb").and_then(|v| v.as_bool()),
            doNotDisturbStart: value.get("doNotDisturbStart").and_then(|v| v.as_str()).map(String::from),
            doNotDisturbEnd: value.get("doNotDisturbEnd").and_then(|v| v.as_str()).map(String::from),
            windowVisible: value.get("windowVisible").and_then(|v| v.as_bool()),
        }
    }
}

impl Settings {
    /// Merge a partial update, clamping each numeric field on the way in
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(ref language) = update.language {
            self.language = language.clone();
        }
        if let Some(ref theme) = update.theme {
            self.theme = theme.clone();
        }
        if let Some(fontSize) = update.fontSize {
            self.fontSize = fontSize;
        }
        if let Some(opacity) = update.opacity {
            self.opacity = clampOpacity(opacity);
        }
        if let Some(alwaysOnTop) = update.alwaysOnTop {
            self.alwaysOnTop = alwaysOnTop;
        }
        if let Some(autoStart) = update.autoStart {
            self.autoStart = autoStart;
        }
        if let Some(notifications) = update.notifications {
            self.notifications = notifications;
        }
        if let Some(sound) = update.sound {
            self.sound = sound;
        }
        if let Some(soundVolume) = update.soundVolume {
            self.soundVolume = clampVolume(soundVolume);
        }
        if let Some(ref httpHost) = update.httpHost {
            self.httpHost = httpHost.clone();
        }
        if let Some(httpPort) = update.httpPort {
            self.httpPort = clampPort(httpPort);
        }
        if let Some(ref customColors) = update.customColors {
            self.customColors = customColors.clone();
        }
        if let Some(reminderThreshold) = update.reminderThreshold {
            self.reminderThreshold = clampThreshold(reminderThreshold);
        }
        if let Some(doNotDisturb) = update.doNotDisturb {
            self.doNotDisturb = doNotDisturb;
        }
        if let Some(ref doNotDisturbStart) = update.doNotDisturbStart {
            self.doNotDisturbStart = doNotDisturbStart.clone();
        }
        if let Some(ref doNotDisturbEnd) = update.doNotDisturbEnd {
            self.doNotDisturbEnd = doNotDisturbEnd.clone();
        }
        if let Some(windowVisible) = update.windowVisible {
            self.windowVisible = windowVisible;
        }
    }
}

/// Portable export document: settings plus the most recent history entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub settings: Settings,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub exportedAt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.opacity, 0.85);
        assert_eq!(settings.httpPort, 31415);
        assert_eq!(settings.reminderThreshold, 100);
        assert_eq!(settings.doNotDisturbStart, "22:00");
    }

    #[test]
    fn test_clamps() {
        assert_eq!(clampOpacity(1.5), 1.0);
        assert_eq!(clampOpacity(0.05), 0.1);
        assert_eq!(clampVolume(1.5), 1.0);
        assert_eq!(clampVolume(-0.5), 0.0);
        assert_eq!(clampPort(80), 1024);
        assert_eq!(clampPort(70000), 65535);
        assert_eq!(clampPort(8080), 8080);
        assert_eq!(clampThreshold(150), 100);
    }

    #[test]
    fn test_from_json_ignores_malformed_fields() {
        let value = serde_json::json!({
            "theme": "light",
            "opacity": "not a number",
            "httpPort": 8080,
            "unknownField": true,
        });
        let update = SettingsUpdate::fromJson(&value);
        assert_eq!(update.theme.as_deref(), Some("light"));
        assert!(update.opacity.is_none());
        assert_eq!(update.httpPort, Some(8080));
    }

    #[test]
    fn test_apply_clamps_each_field() {
        let mut settings = Settings::default();
        settings.apply(&SettingsUpdate {
            opacity: Some(2.0),
            soundVolume: Some(-1.0),
            httpPort: Some(70000),
            reminderThreshold: Some(500),
            theme: Some("ocean".into()),
            ..Default::default()
        });
        assert_eq!(settings.opacity, 1.0);
        assert_eq!(settings.soundVolume, 0.0);
        assert_eq!(settings.httpPort, 65535);
        assert_eq!(settings.reminderThreshold, 100);
        assert_eq!(settings.theme, "ocean");
        // untouched fields keep their values
        assert!(settings.alwaysOnTop);
    }
}
