//! Console transport: prints outbound chat messages to stdout

use async_trait::async_trait;
use chrono::{DateTime, Local};
use panerelay_core::{ChatId, Formatting, Transport, TransportError};
use serde::Serialize;
use tokio::io::{AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

/// One JSON line per outbound item
#[derive(Debug, Serialize)]
struct ConsoleRecord<'a> {
    at: String,
    chat: ChatId,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    formatting: Option<Formatting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

pub struct ConsoleTransport {
    json: bool,
    stdout: Mutex<Stdout>,
}

impl ConsoleTransport {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }

    fn render(
        &self,
        at: DateTime<Local>,
        chat: ChatId,
        message: Option<(&str, Formatting)>,
    ) -> Result<String, TransportError> {
        if self.json {
            let record = ConsoleRecord {
                at: at.to_rfc3339(),
                chat,
                kind: if message.is_some() { "message" } else { "typing" },
                formatting: message.map(|(_, f)| f),
                text: message.map(|(t, _)| t),
            };
            let line = serde_json::to_string(&record)
                .map_err(|e| TransportError::Rejected(e.to_string()))?;
            return Ok(format!("{}\n", line));
        }

        let stamp = at.format("%H:%M:%S");
        Ok(match message {
            Some((text, _)) => format!("[{}] chat {}\n{}\n\n", stamp, chat, text),
            None => format!("[{}] chat {} … working\n", stamp, chat),
        })
    }

    async fn write(&self, rendered: &str) -> Result<(), TransportError> {
        let mut stdout = self.stdout.lock().await;
        stdout.write_all(rendered.as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn deliver(
        &self,
        chat: ChatId,
        text: &str,
        formatting: Formatting,
    ) -> Result<(), TransportError> {
        let rendered = self.render(Local::now(), chat, Some((text, formatting)))?;
        self.write(&rendered).await
    }

    async fn typing(&self, chat: ChatId) -> Result<(), TransportError> {
        let rendered = self.render(Local::now(), chat, None)?;
        self.write(&rendered).await
    }
}
