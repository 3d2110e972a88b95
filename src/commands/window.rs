// Window commands - thin wrappers around the window chrome collaborators
// (move/resize/visibility/always-on-top/auto-start). The widget logic never
// depends on these succeeding; failures are logged and swallowed.

use tauri::{Manager, State};

use crate::store::StoreState;

#[tauri::command]
pub fn getAppVersion() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[tauri::command]
pub fn showWindow(window: tauri::Window) {
    let _ = window.show();
    let _ = window.set_focus();
}

#[tauri::command]
pub fn hideWindow(window: tauri::Window) {
    let _ = window.hide();
}

#[tauri::command]
pub fn minimizeWindow(window: tauri::Window) {
    let _ = window.minimize();
}

#[tauri::command]
pub fn closeWindow(window: tauri::Window) {
    let _ = window.close();
}

#[tauri::command]
pub fn resizeWindow(window: tauri::Window, width: f64, height: f64) {
    let _ = window.set_size(tauri::LogicalSize::new(width, height));
}

#[tauri::command]
pub fn getWindowPosition(window: tauri::Window) -> (f64, f64) {
    window
        .outer_position()
        .map(|p| (p.x as f64, p.y as f64))
        .unwrap_or((0.0, 0.0))
}

#[tauri::command]
pub fn setWindowPosition(window: tauri::Window, x: f64, y: f64) {
    let _ = window.set_position(tauri::LogicalPosition::new(x, y));
}

/// Apply always-on-top to the main window (the settings toggle is separate)
#[tauri::command]
pub fn setAlwaysOnTop(app: tauri::AppHandle, onTop: bool) {
    if let Some(window) = app.get_webview_window("main") {
        let _ = window.set_always_on_top(onTop);
    }
}

#[tauri::command]
pub fn toggleAlwaysOnTop(window: tauri::Window) -> Result<bool, String> {
    let current = window.is_always_on_top().map_err(|e| e.to_string())?;
    let newValue = !current;
    window.set_always_on_top(newValue).map_err(|e| e.to_string())?;
    Ok(newValue)
}

/// Show or hide the main window, remembering the choice in settings
#[tauri::command]
pub fn setWindowVisibility(
    app: tauri::AppHandle,
    store: State<'_, StoreState>,
    visible: bool,
) {
    if let Some(window) = app.get_webview_window("main") {
        if visible {
            let _ = window.show();
            let _ = window.set_focus();
        } else {
            let _ = window.hide();
        }
    }
    store.setWindowVisible(visible);
}

/// Register or remove the login item. macOS only; a no-op elsewhere.
#[tauri::command]
pub fn applyAutoStart(enabled: bool) -> Result<(), String> {
    println!("[applyAutoStart] enabled: {}", enabled);

    #[cfg(target_os = "macos")]
    {
        use std::process::Command;
        let appPath = "/Applications/Vibebar.app";

        if enabled {
            let script = format!(
                r#"tell application "System Events" to make login item at end with properties {{path:"{}", hidden:false}}"#,
                appPath
            );
            Command::new("osascript")
                .args(["-e", &script])
                .output()
                .map_err(|e| e.to_string())?;
        } else {
            let script = r#"tell application "System Events" to delete login item "Vibebar""#;
            let _ = Command::new("osascript").args(["-e", script]).output();
        }
    }

    let _ = enabled;
    Ok(())
}

/// Open (or focus) the settings window
#[tauri::command]
pub fn openSettingsWindow(app: tauri::AppHandle) -> Result<(), String> {
    println!("[openSettingsWindow] Called");

    if let Some(window) = app.get_webview_window("settings") {
        let _ = window.show();
        let _ = window.set_focus();
        return Ok(());
    }

    let window = tauri::WebviewWindowBuilder::new(
        &app,
        "settings",
        tauri::WebviewUrl::App("index.html?type=settings".into()),
    )
    .title("Settings")
    .inner_size(800.0, 600.0)
    .resizable(false)
    .minimizable(false)
    .maximizable(false)
    .decorations(true)
    .transparent(false)
    .visible(true)
    .focused(true)
    .build()
    .map_err(|e| {
        println!("[openSettingsWindow] ERROR building window: {}", e);
        e.to_string()
    })?;

    let _ = window.show();
    let _ = window.set_focus();
    Ok(())
}
