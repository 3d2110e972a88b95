// Models module for Vibebar
// All fields use camelCase for consistency; feed wire types are snake_case

pub mod common;
pub mod config;
pub mod feed;
pub mod history;
pub mod task;

pub use common::{Adapter, TaskStatus};
pub use config::{ConfigDocument, CustomColors, Settings, SettingsUpdate};
pub use feed::{CurrentTaskRef, FeedTask, StatusDocument};
pub use history::HistoryEntry;
pub use task::Task;
