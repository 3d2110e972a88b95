// History commands

use tauri::State;

use crate::models::HistoryEntry;
use crate::store::StoreState;

#[tauri::command]
pub fn getHistory(store: State<'_, StoreState>) -> Vec<HistoryEntry> {
    store.getHistory()
}

#[tauri::command]
pub fn clearHistory(store: State<'_, StoreState>) {
    println!("[clearHistory] Called");
    store.clearHistory();
}
