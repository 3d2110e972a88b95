// Common helpers for commands and stores
// All using camelCase for direct JSON compatibility

use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Get current timestamp in milliseconds
pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

/// Generate new UUID
pub fn newId() -> String {
    Uuid::new_v4().to_string()
}

/// Clamp a reported progress value into 0-100
pub fn clampProgress(value: i64) -> u32 {
    value.clamp(0, 100) as u32
}
