// Common types for Vibebar task tracking
// All fields use camelCase for consistency across Rust, TypeScript, and the wire

use serde::{Deserialize, Serialize};

/// Task status as reported by editors and shown in the widget.
/// `Armed` means registered but no assistant activity yet; `Active` means the
/// associated window currently has focus. `Completed` and `Error` are terminal
/// until the task is explicitly reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Idle,
    Armed,
    Running,
    Active,
    Completed,
    Error,
}

impl TaskStatus {
    pub fn isTerminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "armed" => Some(Self::Armed),
            "running" => Some(Self::Running),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn asStr(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Running => "running",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// Assistant that produced a task. The set is fixed, so this is a closed enum
/// dispatched by match rather than a runtime registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Adapter {
    #[serde(rename = "copilot")]
    Copilot,
    #[serde(rename = "claude-code")]
    ClaudeCode,
    #[serde(rename = "cursor")]
    Cursor,
    #[serde(rename = "cli")]
    Cli,
}

impl Adapter {
    pub fn fromId(id: &str) -> Option<Self> {
        match id {
            "copilot" => Some(Self::Copilot),
            "claude-code" => Some(Self::ClaudeCode),
            "cursor" => Some(Self::Cursor),
            "cli" => Some(Self::Cli),
            _ => None,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::Copilot => "copilot",
            Self::ClaudeCode => "claude-code",
            Self::Cursor => "cursor",
            Self::Cli => "cli",
        }
    }

    /// Display label used in notification bodies
    pub fn label(&self) -> &'static str {
        match self {
            Self::Copilot => "Copilot",
            Self::ClaudeCode => "Claude Code",
            Self::Cursor => "Cursor",
            Self::Cli => "CLI",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        for s in ["idle", "armed", "running", "active", "completed", "error"] {
            let status = TaskStatus::parse(s).unwrap();
            assert_eq!(status.asStr(), s);
        }
        assert!(TaskStatus::parse("cancelled").is_none());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(TaskStatus::Completed.isTerminal());
        assert!(TaskStatus::Error.isTerminal());
        assert!(!TaskStatus::Running.isTerminal());
        assert!(!TaskStatus::Armed.isTerminal());
    }

    #[test]
    fn test_adapter_id_roundtrip() {
        for id in ["copilot", "claude-code", "cursor", "cli"] {
            assert_eq!(Adapter::fromId(id).unwrap().id(), id);
        }
        assert!(Adapter::fromId("windsurf").is_none());
    }
}
