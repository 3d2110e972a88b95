// Settings commands - field-by-field updates plus config export/import

use rfd::FileDialog;
use std::fs;
use tauri::State;

use crate::models::{ConfigDocument, HistoryEntry, Settings, SettingsUpdate};
use crate::store::StoreState;

/// How many history entries travel with an exported config
const EXPORT_HISTORY_LIMIT: usize = 20;

#[tauri::command]
pub fn getSettings(store: State<'_, StoreState>) -> Settings {
    store.getSettings()
}

/// Merge a partial settings update. Out-of-range numbers are clamped, so this
/// never fails from the frontend's point of view.
#[tauri::command]
pub fn updateSettings(store: State<'_, StoreState>, input: SettingsUpdate) {
    println!("[updateSettings] Called");
    store.applySettingsUpdate(&input);
}

fn buildConfigDocument(store: &StoreState) -> ConfigDocument {
    ConfigDocument {
        settings: store.getSettings(),
        history: store
            .getHistory()
            .into_iter()
            .take(EXPORT_HISTORY_LIMIT)
            .collect(),
        exportedAt: chrono::Utc::now().to_rfc3339(),
    }
}

/// Apply a parsed config document. Settings are extracted field by field;
/// history entries are validated one by one. Only a document that fails to
/// parse at the top level is an error the user sees.
fn applyConfigDocument(store: &StoreState, raw: &str) -> Result<(), String> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| format!("Invalid configuration file: {}", e))?;

    if let Some(settings) = value.get("settings") {
        let update = SettingsUpdate::fromJson(settings);
        store.applySettingsUpdate(&update);
    }

    if let Some(entries) = value.get("history").and_then(|v| v.as_array()) {
        let imported: Vec<HistoryEntry> = entries
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect();
        if !imported.is_empty() {
            store.replaceHistory(imported);
        }
    }

    Ok(())
}

#[tauri::command]
pub fn exportConfig(store: State<'_, StoreState>) -> Result<String, String> {
    println!("[exportConfig] Called");
    serde_json::to_string_pretty(&buildConfigDocument(&store)).map_err(|e| e.to_string())
}

#[tauri::command]
pub fn importConfig(store: State<'_, StoreState>, json: String) -> Result<(), String> {
    println!("[importConfig] Called ({} bytes)", json.len());
    applyConfigDocument(&store, &json)
}

/// Write the config document to a file chosen by the user. Returns the path,
/// or None when the dialog was cancelled.
#[tauri::command]
pub fn exportConfigToFile(store: State<'_, StoreState>) -> Result<Option<String>, String> {
    println!("[exportConfigToFile] Called");

    let Some(path) = FileDialog::new()
        .set_title("Export Vibebar Config")
        .set_file_name("vibebar-config.json")
        .save_file()
    else {
        println!("[exportConfigToFile] Cancelled");
        return Ok(None);
    };

    let json = serde_json::to_string_pretty(&buildConfigDocument(&store)).map_err(|e| e.to_string())?;
    fs::write(&path, json).map_err(|e| e.to_string())?;
    println!("[exportConfigToFile] SUCCESS - wrote {}", path.display());
    Ok(Some(path.to_string_lossy().to_string()))
}

/// Import a config document from a file chosen by the user. Returns false
/// when the dialog was cancelled.
#[tauri::command]
pub fn importConfigFromFile(store: State<'_, StoreState>) -> Result<bool, String> {
    println!("[importConfigFromFile] Called");

    let Some(path) = FileDialog::new()
        .set_title("Import Vibebar Config")
        .add_filter("JSON", &["json"])
        .pick_file()
    else {
        println!("[importConfigFromFile] Cancelled");
        return Ok(false);
    };

    let raw = fs::read_to_string(&path).map_err(|e| format!("Failed to read file: {}", e))?;
    applyConfigDocument(&store, &raw)?;
    println!("[importConfigFromFile] SUCCESS - imported {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::newId;
    use crate::store::Store;
    use std::sync::Arc;

    fn testStore() -> StoreState {
        Arc::new(Store::new(
            std::env::temp_dir().join(format!("vibebar-test-{}.md", newId())),
        ))
    }

    #[test]
    fn test_export_import_roundtrip() {
        let store = testStore();
        store.setTheme("midnight".into());
        store.setReminderThreshold(75);
        let id = store.addTask("Exported".into(), None, None, None);
        store.completeTask(&id, Some(99));
        store.addToHistory(&store.getTask(&id).unwrap());

        let json = serde_json::to_string_pretty(&buildConfigDocument(&store)).unwrap();

        let other = testStore();
        applyConfigDocument(&other, &json).unwrap();
        assert_eq!(other.getSettings().theme, "midnight");
        assert_eq!(other.getSettings().reminderThreshold, 75);
        assert_eq!(other.getHistory().len(), 1);
        assert_eq!(other.getHistory()[0].name, "Exported");
    }

    #[test]
    fn test_import_ignores_malformed_fields() {
        let store = testStore();
        let raw = r#"{
            "settings": {
                "theme": "light",
                "opacity": "oops",
                "httpPort": 99999,
                "mystery": 1
            },
            "history": [
                { "id": "h1", "name": "Ok", "progress": 100, "tokens": 0,
                  "status": "completed", "startTime": 1 },
                { "bogus": true }
            ]
        }"#;

        applyConfigDocument(&store, raw).unwrap();
        let settings = store.getSettings();
        assert_eq!(settings.theme, "light");
        assert_eq!(settings.opacity, 0.85); // malformed field ignored
        assert_eq!(settings.httpPort, 65535); // clamped
        assert_eq!(store.getHistory().len(), 1);
    }

    #[test]
    fn test_import_rejects_unparseable_document() {
        let store = testStore();
        assert!(applyConfigDocument(&store, "not json {").is_err());
    }
}
