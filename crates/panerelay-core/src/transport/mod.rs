//! Chat transport seam
//!
//! The monitor never talks to a chat service directly. It produces
//! [`Outbound`] items which the [`Outbox`] hands to a background delivery
//! task, so a slow or failing send never stalls the polling loop.
//!
//! # Components
//!
//! - [`Transport`]: implemented by a concrete chat backend
//! - [`Outbox`]: fire-and-forget queue in front of a transport
//! - [`split_message`]: length-capped chunking

mod split;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::TransportError;
use crate::types::ChatId;

pub use split::{split_message, MONOSPACE_FENCE, MONOSPACE_WRAPPER_LEN};

// ========== Types ==========

/// How a message body should be rendered by the chat backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formatting {
    #[default]
    Plain,
    /// Lightly marked-up text (bold, italics, inline code)
    Markdown,
    /// Pre-formatted block, used for verbatim pane echoes
    Monospace,
}

/// One notification produced by the monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// "assistant is working" indicator
    Typing,
    Message { text: String, formatting: Formatting },
}

impl Outbound {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Message {
            text: text.into(),
            formatting: Formatting::Plain,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self::Message {
            text: text.into(),
            formatting: Formatting::Markdown,
        }
    }

    pub fn monospace(text: impl Into<String>) -> Self {
        Self::Message {
            text: text.into(),
            formatting: Formatting::Monospace,
        }
    }

    /// Message body, `None` for the typing indicator
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Typing => None,
            Self::Message { text, .. } => Some(text),
        }
    }
}

/// Chat backend
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one chunk. Callers have already split it to the size limit.
    async fn deliver(
        &self,
        chat: ChatId,
        text: &str,
        formatting: Formatting,
    ) -> Result<(), TransportError>;

    /// Show a transient "working" indicator
    async fn typing(&self, chat: ChatId) -> Result<(), TransportError>;
}

// ========== Outbox ==========

#[derive(Debug)]
struct Envelope {
    chat: ChatId,
    item: Outbound,
}

/// Fire-and-forget queue in front of a [`Transport`].
///
/// Delivery is at-most-once: a failed send is logged and dropped, never
/// retried.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl Outbox {
    /// Start the delivery task. It ends once every `Outbox` clone is dropped.
    pub fn spawn(transport: Arc<dyn Transport>, max_message_len: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Self::delivery_loop(transport, rx, max_message_len));
        (Self { tx }, handle)
    }

    /// Queue one item. Never blocks.
    pub fn send(&self, chat: ChatId, item: Outbound) {
        if self.tx.send(Envelope { chat, item }).is_err() {
            warn!(chat = chat, "Outbox closed, dropping message");
        }
    }

    pub fn send_all(&self, chat: ChatId, items: impl IntoIterator<Item = Outbound>) {
        for item in items {
            self.send(chat, item);
        }
    }

    async fn delivery_loop(
        transport: Arc<dyn Transport>,
        mut rx: mpsc::UnboundedReceiver<Envelope>,
        max_message_len: usize,
    ) {
        while let Some(Envelope { chat, item }) = rx.recv().await {
            match item {
                Outbound::Typing => {
                    if let Err(e) = transport.typing(chat).await {
                        debug!(chat = chat, error = %e, "Typing indicator failed");
                    }
                }
                Outbound::Message { text, formatting } => {
                    for chunk in split_message(&text, formatting, max_message_len) {
                        if let Err(e) = transport.deliver(chat, &chunk, formatting).await {
                            warn!(chat = chat, error = %e, "Delivery failed, not retrying");
                        }
                    }
                }
            }
        }
        debug!("Outbox delivery loop stopped");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`Transport`] used across the crate's tests

    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingTransport {
        pub delivered: Mutex<Vec<(ChatId, String, Formatting)>>,
        pub typing: Mutex<u32>,
        pub fail_first: Mutex<bool>,
    }

    impl RecordingTransport {
        pub async fn texts(&self) -> Vec<String> {
            self.delivered
                .lock()
                .await
                .iter()
                .map(|(_, text, _)| text.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn deliver(
            &self,
            chat: ChatId,
            text: &str,
            formatting: Formatting,
        ) -> Result<(), TransportError> {
            let mut fail = self.fail_first.lock().await;
            if *fail {
                *fail = false;
                return Err(TransportError::Rejected("flood control".to_string()));
            }
            self.delivered
                .lock()
                .await
                .push((chat, text.to_string(), formatting));
            Ok(())
        }

        async fn typing(&self, _chat: ChatId) -> Result<(), TransportError> {
            *self.typing.lock().await += 1;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingTransport;
    use super::*;

    #[tokio::test]
    async fn test_outbox_delivers_in_order() {
        let transport = Arc::new(RecordingTransport::default());
        let (outbox, handle) = Outbox::spawn(transport.clone(), 4000);

        outbox.send(7, Outbound::Typing);
        outbox.send_all(7, vec![Outbound::plain("first"), Outbound::markdown("*second*")]);
        drop(outbox);
        handle.await.unwrap();

        let delivered = transport.delivered.lock().await;
        assert_eq!(
            *delivered,
            vec![
                (7, "first".to_string(), Formatting::Plain),
                (7, "*second*".to_string(), Formatting::Markdown),
            ]
        );
        assert_eq!(*transport.typing.lock().await, 1);
    }

    #[tokio::test]
    async fn test_failed_send_is_not_retried() {
        let transport = Arc::new(RecordingTransport::default());
        *transport.fail_first.lock().await = true;
        let (outbox, handle) = Outbox::spawn(transport.clone(), 4000);

        outbox.send(1, Outbound::plain("lost"));
        outbox.send(1, Outbound::plain("kept"));
        drop(outbox);
        handle.await.unwrap();

        let delivered = transport.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].1, "kept");
    }

    #[tokio::test]
    async fn test_long_message_chunked() {
        let transport = Arc::new(RecordingTransport::default());
        let (outbox, handle) = Outbox::spawn(transport.clone(), 20);

        outbox.send(1, Outbound::monospace("line one\nline two\nline three"));
        drop(outbox);
        handle.await.unwrap();

        let delivered = transport.delivered.lock().await;
        assert!(delivered.len() > 1);
        assert!(delivered.iter().all(|(_, text, _)| text.chars().count() <= 20));
    }

    #[test]
    fn test_outbound_serializes_tagged() {
        let json = serde_json::to_string(&Outbound::plain("hi")).unwrap();
        assert_eq!(json, r#"{"type":"message","text":"hi","formatting":"plain"}"#);
        assert_eq!(serde_json::to_string(&Outbound::Typing).unwrap(), r#"{"type":"typing"}"#);
    }
}
