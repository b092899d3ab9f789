//! Process-control seam
//!
//! The monitor only observes and pokes the assistant's terminal through
//! [`SessionControl`]; it never manages the process lifecycle itself.

mod tmux;

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::ControlError;
use crate::semantic::PROMPT_GLYPH;

pub use tmux::TmuxControl;

/// Named keypress understood by the terminal multiplexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Enter,
    Escape,
}

impl Key {
    pub fn tmux_name(&self) -> &'static str {
        match self {
            Key::Up => "Up",
            Key::Down => "Down",
            Key::Enter => "Enter",
            Key::Escape => "Escape",
        }
    }
}

/// Controlled terminal session hosting the assistant
#[async_trait]
pub trait SessionControl: Send + Sync {
    async fn session_exists(&self) -> bool;

    /// Raw pane capture, history included
    async fn capture(&self) -> Result<String, ControlError>;

    /// Type `text` literally, then submit it
    async fn send_text(&self, text: &str) -> Result<(), ControlError>;

    async fn send_key(&self, key: Key) -> Result<(), ControlError>;

    /// Start a fresh session running the assistant
    async fn create_session(&self, unattended: bool) -> Result<(), ControlError>;

    /// Tear down every session this relay may have created
    async fn destroy_all(&self) -> Result<(), ControlError>;
}

/// Poll until the prompt glyph shows up or `timeout` elapses
pub async fn wait_for_ready(
    control: &dyn SessionControl,
    timeout: Duration,
    interval: Duration,
) -> bool {
    let start = Instant::now();
    loop {
        match control.capture().await {
            Ok(raw) if raw.contains(PROMPT_GLYPH) => {
                info!(elapsed_ms = start.elapsed().as_millis() as u64, "Assistant ready");
                return true;
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "Capture failed while waiting for prompt"),
        }
        if start.elapsed() + interval > timeout {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Move the menu cursor from `cursor` to `target`, then confirm
pub async fn select_option(
    control: &dyn SessionControl,
    target: u32,
    cursor: u32,
) -> Result<(), ControlError> {
    let key = if target > cursor { Key::Down } else { Key::Up };
    for _ in 0..target.abs_diff(cursor) {
        control.send_key(key).await?;
    }
    control.send_key(Key::Enter).await
}
