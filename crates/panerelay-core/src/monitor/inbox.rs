//! Inbound chat messages
//!
//! Everything the chat side can ask of the relay: free text destined for the
//! assistant, or one of a small set of slash commands.

use serde::{Deserialize, Serialize};

use crate::types::ChatId;

/// Slash command understood by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Restart,
    Yolo,
    Stop,
    Screen,
    Status,
    Help,
}

impl Command {
    /// Parse `/name` or `/name@bot args`; `None` for unknown commands
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "restart" => Some(Self::Restart),
            "yolo" => Some(Self::Yolo),
            "stop" => Some(Self::Stop),
            "screen" => Some(Self::Screen),
            "status" => Some(Self::Status),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Restart => "restart",
            Self::Yolo => "yolo",
            Self::Stop => "stop",
            Self::Screen => "screen",
            Self::Status => "status",
            Self::Help => "help",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum InboundKind {
    Text(String),
    Command(Command),
}

/// One message received from the chat side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inbound {
    pub chat: ChatId,
    pub kind: InboundKind,
}

impl Inbound {
    /// Classify a raw chat line. Blank text and unknown commands yield `None`.
    pub fn parse(chat: ChatId, text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let kind = if trimmed.starts_with('/') {
            InboundKind::Command(Command::parse(trimmed)?)
        } else {
            InboundKind::Text(trimmed.to_string())
        };
        Some(Self { chat, kind })
    }

    pub fn text(chat: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat,
            kind: InboundKind::Text(text.into()),
        }
    }

    pub fn command(chat: ChatId, command: Command) -> Self {
        Self {
            chat,
            kind: InboundKind::Command(command),
        }
    }
}
