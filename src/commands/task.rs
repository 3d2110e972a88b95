// Task commands - thin wrappers over the store
// Every mutator is infallible from the frontend's point of view; bad input is
// clamped or ignored, never surfaced as an error

use tauri::State;

use crate::models::{Adapter, Task, TaskStatus};
use crate::store::StoreState;

#[tauri::command]
pub fn getTasks(store: State<'_, StoreState>) -> Vec<Task> {
    store.getTasks()
}

#[tauri::command]
pub fn getCurrentTask(store: State<'_, StoreState>) -> Option<Task> {
    store.currentTask()
}

#[tauri::command]
pub fn addTask(
    store: State<'_, StoreState>,
    name: String,
    adapter: Option<String>,
    ide: Option<String>,
    windowTitle: Option<String>,
) -> String {
    println!("[addTask] name: {}, adapter: {:?}, ide: {:?}", name, adapter, ide);
    let adapter = adapter.as_deref().and_then(Adapter::fromId);
    store.addTask(name, adapter, ide, windowTitle)
}

#[tauri::command]
pub fn removeTask(store: State<'_, StoreState>, id: String) {
    println!("[removeTask] id: {}", id);
    store.removeTask(&id);
}

#[tauri::command]
pub fn setCurrentTask(store: State<'_, StoreState>, id: Option<String>) {
    store.setCurrentTask(id);
}

#[tauri::command]
pub fn updateProgress(store: State<'_, StoreState>, id: String, progress: i64) {
    store.updateProgress(&id, progress);
}

#[tauri::command]
pub fn updateTokens(store: State<'_, StoreState>, id: String, amount: u64, increment: Option<bool>) {
    store.updateTokens(&id, amount, increment.unwrap_or(false));
}

#[tauri::command]
pub fn updateStatus(store: State<'_, StoreState>, id: String, status: String) {
    match TaskStatus::parse(&status) {
        Some(status) => store.updateStatus(&id, status),
        None => println!("[updateStatus] ignoring unknown status: {}", status),
    }
}

#[tauri::command]
pub fn completeTask(store: State<'_, StoreState>, id: String, totalTokens: Option<u64>) {
    println!("[completeTask] id: {}, totalTokens: {:?}", id, totalTokens);
    store.completeTask(&id, totalTokens);
}

#[tauri::command]
pub fn resetTask(store: State<'_, StoreState>, id: String) {
    println!("[resetTask] id: {}", id);
    store.resetTask(&id);
}
