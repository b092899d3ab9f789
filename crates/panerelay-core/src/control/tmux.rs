//! tmux-backed session control

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::TmuxConfig;
use crate::error::ControlError;

use super::{Key, SessionControl};

const TMUX: &str = "tmux";

/// Drives the assistant inside a named tmux session
#[derive(Debug, Clone)]
pub struct TmuxControl {
    config: TmuxConfig,
}

impl TmuxControl {
    pub fn new(config: TmuxConfig) -> Self {
        Self { config }
    }

    pub fn session(&self) -> &str {
        &self.config.session
    }

    async fn run(&self, args: &[&str]) -> Result<String, ControlError> {
        debug!(args = ?args, "tmux");
        let output = Command::new(TMUX)
            .args(args)
            .output()
            .await
            .map_err(|source| ControlError::Spawn {
                program: TMUX.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ControlError::CommandFailed {
                command: format!("{} {}", TMUX, args.join(" ")),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Shell line typed into the fresh session to start the assistant
    pub fn launch_command(&self, unattended: bool) -> String {
        let mut parts: Vec<String> = self
            .config
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, shell_quote(v)))
            .collect();
        parts.push(self.config.command.clone());
        if unattended && !self.config.unattended_flag.is_empty() {
            parts.push(self.config.unattended_flag.clone());
        }
        parts.join(" ")
    }
}

/// Single-quote `value` unless it is made only of shell-safe characters
fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.,:/=+@%".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

#[async_trait]
impl SessionControl for TmuxControl {
    async fn session_exists(&self) -> bool {
        self.run(&["has-session", "-t", self.session()]).await.is_ok()
    }

    async fn capture(&self) -> Result<String, ControlError> {
        let start = format!("-{}", self.config.history_lines);
        self.run(&["capture-pane", "-t", self.session(), "-p", "-S", start.as_str()])
            .await
    }

    async fn send_text(&self, text: &str) -> Result<(), ControlError> {
        self.run(&["send-keys", "-t", self.session(), "-l", text]).await?;
        self.send_key(Key::Enter).await
    }

    async fn send_key(&self, key: Key) -> Result<(), ControlError> {
        self.run(&["send-keys", "-t", self.session(), key.tmux_name()])
            .await
            .map(|_| ())
    }

    async fn create_session(&self, unattended: bool) -> Result<(), ControlError> {
        if let Err(e) = self.destroy_all().await {
            warn!(error = %e, "Failed to clear previous sessions");
        }

        let width = self.config.width.to_string();
        let height = self.config.height.to_string();
        // -u: the assistant's markers (❯, ⏺) need a UTF-8 client
        self.run(&[
            "-u",
            "new-session",
            "-d",
            "-s",
            self.session(),
            "-x",
            width.as_str(),
            "-y",
            height.as_str(),
        ])
        .await?;

        let launch = self.launch_command(unattended);
        self.run(&["send-keys", "-t", self.session(), launch.as_str(), "Enter"])
            .await?;
        info!(session = %self.session(), unattended, "Assistant session created");
        Ok(())
    }

    async fn destroy_all(&self) -> Result<(), ControlError> {
        // No tmux server means no sessions
        let listing = match self.run(&["list-sessions", "-F", "#{session_name}"]).await {
            Ok(listing) => listing,
            Err(ControlError::CommandFailed { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };

        for name in listing
            .lines()
            .map(str::trim)
            .filter(|n| n.contains(self.session()))
        {
            match self.run(&["kill-session", "-t", name]).await {
                Ok(_) => info!(session = %name, "Session killed"),
                Err(e) => warn!(session = %name, error = %e, "Failed to kill session"),
            }
        }
        Ok(())
    }
}
