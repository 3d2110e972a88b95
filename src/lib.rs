// Allow non-snake_case names for JSON serialization compatibility with TypeScript frontend
#![allow(non_snake_case)]

mod commands;
mod mcp;
mod models;
mod notify;
mod server;
mod store;
mod sync;

use std::sync::Arc;
use parking_lot::RwLock;
use tauri::{
    menu::{Menu, MenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    Manager, State, WindowEvent,
};
use tokio_util::sync::CancellationToken;

#[cfg(target_os = "macos")]
use tauri::ActivationPolicy;

use notify::{Dispatcher, TauriAlertSink};
use server::FeedState;
use store::StoreState;
use sync::Synchronizer;

// ============================================
// SERVER MANAGERS
// ============================================

// MCP Server state
pub struct MCPServerManager {
    is_running: Arc<RwLock<bool>>,
    cancel_token: Arc<RwLock<Option<CancellationToken>>>,
}

impl MCPServerManager {
    pub fn new() -> Self {
        Self {
            is_running: Arc::new(RwLock::new(false)),
            cancel_token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }
}

// Status feed server state, same shape as the MCP manager
pub struct FeedServerManager {
    is_running: Arc<RwLock<bool>>,
    cancel_token: Arc<RwLock<Option<CancellationToken>>>,
}

impl FeedServerManager {
    pub fn new() -> Self {
        Self {
            is_running: Arc::new(RwLock::new(false)),
            cancel_token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }
}

const MCP_BIND_ADDRESS: &str = "127.0.0.1:44055";

// ============================================
// MCP SERVER COMMANDS
// ============================================

#[tauri::command]
async fn start_mcp_server(
    app: tauri::AppHandle,
    mcp_manager: State<'_, MCPServerManager>,
    feed: State<'_, Arc<FeedState>>,
) -> Result<(), String> {
    use rmcp::transport::streamable_http_server::{
        StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
    };

    if *mcp_manager.is_running.read() {
        return Err("MCP server is already running".to_string());
    }

    println!("[MCP] Starting server on {}...", MCP_BIND_ADDRESS);

    let feed_arc = feed.inner().clone();
    let app_handle = app.clone();

    let ct = CancellationToken::new();
    *mcp_manager.cancel_token.write() = Some(ct.clone());

    // Create the MCP service
    let service = StreamableHttpService::new(
        move || Ok(mcp::VibebarServer::new(feed_arc.clone(), app_handle.clone())),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            cancellation_token: ct.child_token(),
            ..Default::default()
        },
    );

    let router = axum::Router::new().fallback_service(service);

    let is_running = mcp_manager.is_running.clone();
    *is_running.write() = true;

    // Start server in background
    tokio::spawn(async move {
        let tcp_listener = match tokio::net::TcpListener::bind(MCP_BIND_ADDRESS).await {
            Ok(l) => l,
            Err(e) => {
                eprintln!("[MCP] Failed to bind: {}", e);
                *is_running.write() = false;
                return;
            }
        };

        println!("[MCP] Server started successfully on {}", MCP_BIND_ADDRESS);

        let _ = axum::serve(tcp_listener, router)
            .with_graceful_shutdown(async move {
                ct.cancelled().await;
            })
            .await;

        *is_running.write() = false;
        println!("[MCP] Server stopped");
    });

    Ok(())
}

#[tauri::command]
async fn stop_mcp_server(mcp_manager: State<'_, MCPServerManager>) -> Result<(), String> {
    println!("[MCP] Stopping server...");
    if let Some(ct) = mcp_manager.cancel_token.read().as_ref() {
        ct.cancel();
    }
    *mcp_manager.cancel_token.write() = None;
    Ok(())
}

#[tauri::command]
async fn get_mcp_server_status(mcp_manager: State<'_, MCPServerManager>) -> Result<bool, String> {
    Ok(mcp_manager.is_running())
}

// ============================================
// FEED SERVER COMMANDS
// ============================================

fn spawnFeedServer(manager: &FeedServerManager, feed: Arc<FeedState>, host: String, port: u16) {
    let ct = CancellationToken::new();
    *manager.cancel_token.write() = Some(ct.clone());

    let is_running = manager.is_running.clone();
    *is_running.write() = true;

    tauri::async_runtime::spawn(async move {
        if let Err(e) = server::startServer(feed, host, port, ct).await {
            eprintln!("[FeedServer] {}", e);
        }
        *is_running.write() = false;
        println!("[FeedServer] Server stopped");
    });
}

#[tauri::command]
async fn start_feed_server(
    store: State<'_, StoreState>,
    feed: State<'_, Arc<FeedState>>,
    feed_manager: State<'_, FeedServerManager>,
    port: Option<u16>,
) -> Result<(), String> {
    if *feed_manager.is_running.read() {
        return Err("Feed server is already running".to_string());
    }
    let settings = store.getSettings();
    spawnFeedServer(
        &feed_manager,
        feed.inner().clone(),
        settings.httpHost,
        port.unwrap_or(settings.httpPort),
    );
    Ok(())
}

#[tauri::command]
async fn stop_feed_server(feed_manager: State<'_, FeedServerManager>) -> Result<(), String> {
    println!("[FeedServer] Stopping server...");
    if let Some(ct) = feed_manager.cancel_token.read().as_ref() {
        ct.cancel();
    }
    *feed_manager.cancel_token.write() = None;
    Ok(())
}

#[tauri::command]
async fn get_feed_server_status(feed_manager: State<'_, FeedServerManager>) -> Result<bool, String> {
    Ok(feed_manager.is_running())
}

// ============================================
// APP
// ============================================

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_shell::init())
        .setup(|app| {
            // Hide from dock on macOS (tray + floating widget)
            #[cfg(target_os = "macos")]
            app.set_activation_policy(ActivationPolicy::Accessory);

            // Initialize the store (settings + history load here)
            let store = store::initStore();
            let settings = store.getSettings();
            app.manage(store.clone());

            // Feed state is constructed here and handed around explicitly
            let feed = Arc::new(FeedState::new());
            app.manage(feed.clone());
            app.manage(MCPServerManager::new());

            // Alerts react to store events from here on
            Dispatcher::attach(
                store.clone(),
                Arc::new(TauriAlertSink::new(app.handle().clone())),
            );

            // Main window: restore preferences, close hides instead of quitting
            if let Some(window) = app.get_webview_window("main") {
                let _ = window.set_always_on_top(settings.alwaysOnTop);
                if !settings.windowVisible {
                    let _ = window.hide();
                }

                #[cfg(target_os = "macos")]
                {
                    use window_vibrancy::{apply_vibrancy, NSVisualEffectMaterial, NSVisualEffectState};
                    let _ = apply_vibrancy(
                        &window,
                        NSVisualEffectMaterial::HudWindow,
                        Some(NSVisualEffectState::Active),
                        Some(12.0),
                    );
                }

                #[cfg(target_os = "windows")]
                {
                    use window_vibrancy::apply_blur;
                    let _ = apply_blur(&window, Some((18, 18, 18, 200)));
                }

                let window_clone = window.clone();
                let app_handle = app.handle().clone();
                window.on_window_event(move |event| {
                    if let WindowEvent::CloseRequested { api, .. } = event {
                        api.prevent_close();
                        let store = app_handle.state::<StoreState>();
                        store.setWindowVisible(false);
                        let _ = window_clone.hide();
                    }
                });
            }

            // Start the status feed server on the configured port
            let feed_manager = FeedServerManager::new();
            spawnFeedServer(
                &feed_manager,
                feed.clone(),
                settings.httpHost.clone(),
                settings.httpPort,
            );
            app.manage(feed_manager);

            // Start the poll loop that reconciles the feed into the store
            tauri::async_runtime::spawn(Synchronizer::new(store.clone()).run());

            // Create tray menu
            let toggle = MenuItem::with_id(app, "toggle-window", "Show/Hide", true, None::<&str>)?;
            let settings_item = MenuItem::with_id(app, "settings", "Settings", true, None::<&str>)?;
            let quit = MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?;
            let menu = Menu::with_items(app, &[&toggle, &settings_item, &quit])?;

            // Build tray icon
            let mut tray = TrayIconBuilder::with_id("main-tray")
                .tooltip("Vibebar")
                .menu(&menu)
                .show_menu_on_left_click(false)
                .on_menu_event(|app, event| match event.id.as_ref() {
                    "toggle-window" => {
                        if let Some(window) = app.get_webview_window("main") {
                            let store = app.state::<StoreState>();
                            let visible = window.is_visible().unwrap_or(true);
                            if visible {
                                let _ = window.hide();
                            } else {
                                let _ = window.show();
                                let _ = window.set_focus();
                            }
                            store.setWindowVisible(!visible);
                        }
                    }
                    "settings" => {
                        let _ = commands::window::openSettingsWindow(app.clone());
                    }
                    "quit" => app.exit(0),
                    _ => {}
                })
                .on_tray_icon_event(|tray, event| {
                    if let TrayIconEvent::Click {
                        button: MouseButton::Left,
                        button_state: MouseButtonState::Up,
                        ..
                    } = event
                    {
                        let app = tray.app_handle();
                        if let Some(window) = app.get_webview_window("main") {
                            let _ = window.show();
                            let _ = window.set_focus();
                        }
                    }
                });
            if let Some(icon) = app.default_window_icon() {
                tray = tray.icon(icon.clone()).icon_as_template(false);
            }
            let _tray = tray.build(app)?;

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // MCP Server
            start_mcp_server,
            stop_mcp_server,
            get_mcp_server_status,
            // Feed server
            start_feed_server,
            stop_feed_server,
            get_feed_server_status,
            // Tasks
            commands::task::getTasks,
            commands::task::getCurrentTask,
            commands::task::addTask,
            commands::task::removeTask,
            commands::task::setCurrentTask,
            commands::task::updateProgress,
            commands::task::updateTokens,
            commands::task::updateStatus,
            commands::task::completeTask,
            commands::task::resetTask,
            // Settings
            commands::settings::getSettings,
            commands::settings::updateSettings,
            commands::settings::exportConfig,
            commands::settings::importConfig,
            commands::settings::exportConfigToFile,
            commands::settings::importConfigFromFile,
            // History
            commands::history::getHistory,
            commands::history::clearHistory,
            // Window
            commands::window::getAppVersion,
            commands::window::showWindow,
            commands::window::hideWindow,
            commands::window::minimizeWindow,
            commands::window::closeWindow,
            commands::window::resizeWindow,
            commands::window::getWindowPosition,
            commands::window::setWindowPosition,
            commands::window::setAlwaysOnTop,
            commands::window::toggleAlwaysOnTop,
            commands::window::setWindowVisibility,
            commands::window::applyAutoStart,
            commands::window::openSettingsWindow,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
