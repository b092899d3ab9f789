//! Core types shared by the parsers and the session monitor

use serde::{Deserialize, Serialize};

/// Chat identifier assigned by the transport
pub type ChatId = i64;

/// Discrete activity state of the assistant, derived from the pane tail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    /// Prompt visible, waiting for input
    #[default]
    Idle,
    /// Generating output or running tools
    Working,
    /// Blocked on a yes/no/always permission dialog
    Permission,
    /// Showing a navigable multiple-choice question
    Asking,
}

impl ActivityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityState::Idle => "idle",
            ActivityState::Working => "working",
            ActivityState::Permission => "permission",
            ActivityState::Asking => "asking",
        }
    }

    /// Dialog states block the assistant until the user answers
    pub fn is_dialog(&self) -> bool {
        matches!(self, ActivityState::Permission | ActivityState::Asking)
    }
}

impl std::fmt::Display for ActivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permission dialog found in the pane tail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInfo {
    /// Stable identity of the dialog, derived from `context` only
    pub fingerprint: String,
    /// Lines preceding the confirmation phrase ("what is being requested")
    pub context: String,
}

/// One selectable entry of a structured question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskOption {
    /// Number exactly as printed in the terminal
    pub num: u32,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AskOption {
    pub fn new(num: u32, label: impl Into<String>) -> Self {
        Self {
            num,
            label: label.into(),
            description: None,
        }
    }
}

/// Numbered multiple-choice question presented by the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskQuestionInfo {
    pub header: String,
    pub question: String,
    /// Real options, the free-text placeholder excluded
    pub options: Vec<AskOption>,
    /// Printed number of the "Type something" entry, if present
    pub type_option: Option<u32>,
    /// Option currently highlighted by the cursor glyph
    pub cursor_pos: u32,
}

impl AskQuestionInfo {
    pub fn option_numbers(&self) -> Vec<u32> {
        self.options.iter().map(|o| o.num).collect()
    }

    pub fn has_option(&self, num: u32) -> bool {
        self.options.iter().any(|o| o.num == num)
    }

    pub fn has_type_option(&self) -> bool {
        self.type_option.is_some()
    }

    /// Number to select for a free-text answer
    pub fn type_option_num(&self) -> Option<u32> {
        self.type_option
    }
}

/// Plan-mode transition announced in the pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanChange {
    Entered,
    Exited,
}
