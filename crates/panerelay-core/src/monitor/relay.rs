//! Relay - async driver around the session monitor
//!
//! The only place that touches the collaborators. One task owns the
//! [`SessionMonitor`] and multiplexes two event sources:
//!
//! ```text
//!   poll ticker (500 ms) ──┐
//!                          ├──> Relay ──> SessionControl (tmux)
//!   inbound chat channel ──┘        └───> Outbox ──> Transport
//! ```
//!
//! Inbound handlers run between ticks on the same task, so they mutate the
//! monitor through its narrow accessors without any locking.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::RelayConfig;
use crate::control::{select_option, wait_for_ready, SessionControl};
use crate::error::ControlError;
use crate::pane::Snapshot;
use crate::transport::{Outbound, Outbox};
use crate::types::{AskQuestionInfo, ChatId};

use super::inbox::{Command, Inbound, InboundKind};
use super::notice;
use super::session::{MonitorSettings, Observation, SessionMonitor};

/// Pause between selecting the free-text entry and typing into it
const TYPE_OPTION_DELAY: Duration = Duration::from_millis(300);

pub struct Relay {
    control: Arc<dyn SessionControl>,
    outbox: Outbox,
    monitor: SessionMonitor,
    config: RelayConfig,
    /// Chat receiving notifications; nothing is polled while unbound
    chat: Option<ChatId>,
}

impl Relay {
    pub fn new(control: Arc<dyn SessionControl>, outbox: Outbox, config: RelayConfig) -> Self {
        let monitor = SessionMonitor::new(MonitorSettings::from_config(&config));
        Self {
            control,
            outbox,
            monitor,
            config,
            chat: None,
        }
    }

    pub fn bind(&mut self, chat: ChatId) {
        if self.chat != Some(chat) {
            info!(chat = chat, "Chat bound");
        }
        self.chat = Some(chat);
    }

    pub fn chat(&self) -> Option<ChatId> {
        self.chat
    }

    pub fn monitor(&self) -> &SessionMonitor {
        &self.monitor
    }

    pub fn set_unattended(&mut self, unattended: bool) {
        self.monitor.set_unattended(unattended);
    }

    /// Run until the inbound channel closes
    pub async fn run(mut self, mut inbound: mpsc::Receiver<Inbound>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            poll_ms = self.config.poll_interval_ms,
            delivery = ?self.config.delivery,
            "Relay started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.poll().await,
                msg = inbound.recv() => match msg {
                    Some(msg) => self.handle(msg).await,
                    None => {
                        info!("Inbound channel closed, relay stopping");
                        break;
                    }
                }
            }
        }
    }

    // ========== Polling ==========

    /// One monitor tick
    pub async fn poll(&mut self) {
        let Some(chat) = self.chat else {
            return;
        };

        let observation = if self.control.session_exists().await {
            match self.control.capture().await {
                Ok(raw) => Observation::Captured(raw),
                Err(e) => {
                    warn!(error = %e, "Capture failed, skipping tick");
                    return;
                }
            }
        } else {
            Observation::Missing
        };

        let out = self.monitor.observe(observation, std::time::Instant::now());
        self.outbox.send_all(chat, out);
    }

    // ========== Inbound ==========

    pub async fn handle(&mut self, inbound: Inbound) {
        let chat = inbound.chat;
        let result = match inbound.kind {
            InboundKind::Command(command) => {
                debug!(chat = chat, command = command.as_str(), "Command received");
                self.handle_command(chat, command).await
            }
            InboundKind::Text(text) => self.handle_text(chat, &text).await,
        };
        if let Err(e) = result {
            warn!(chat = chat, error = %e, "Inbound handling failed");
        }
    }

    async fn handle_command(&mut self, chat: ChatId, command: Command) -> Result<(), ControlError> {
        match command {
            Command::Start => {
                let first_time = self.chat.is_none();
                self.bind(chat);
                self.notify(chat, Outbound::markdown(notice::welcome(first_time)));
            }
            Command::Restart => {
                self.teardown().await;
                self.notify(chat, Outbound::plain(notice::restarted()));
            }
            Command::Yolo => {
                self.bind(chat);
                self.teardown().await;
                self.monitor.set_unattended(true);
                if self.start_session(chat).await {
                    self.notify(chat, Outbound::markdown(notice::unattended_enabled()));
                }
            }
            Command::Stop => {
                self.teardown().await;
                self.chat = None;
                info!(chat = chat, "Chat unbound");
                self.notify(chat, Outbound::plain(notice::stopped()));
            }
            Command::Screen => {
                if !self.control.session_exists().await {
                    self.notify(chat, Outbound::plain(notice::no_session()));
                    return Ok(());
                }
                let snapshot = Snapshot::from_raw(&self.control.capture().await?);
                if snapshot.is_blank() {
                    self.notify(chat, Outbound::plain(notice::empty_screen()));
                } else {
                    self.notify(chat, Outbound::monospace(snapshot.text().trim_end()));
                }
            }
            Command::Status => {
                let alive = self.control.session_exists().await;
                self.notify(
                    chat,
                    Outbound::markdown(notice::status(
                        alive,
                        self.monitor.activity(),
                        self.monitor.in_plan_mode(),
                        self.monitor.unattended(),
                    )),
                );
            }
            Command::Help => self.notify(chat, Outbound::markdown(notice::help())),
        }
        Ok(())
    }

    async fn handle_text(&mut self, chat: ChatId, text: &str) -> Result<(), ControlError> {
        self.bind(chat);

        if let Some(question) = self.monitor.pending_question().cloned() {
            return self.answer_question(chat, &question, text).await;
        }

        if self.monitor.pending_permission().is_some() {
            // the reply is the choice itself, typed straight into the dialog
            self.control.send_text(text).await?;
            self.monitor.clear_pending_permission();
            return Ok(());
        }

        if !self.control.session_exists().await && !self.start_session(chat).await {
            return Ok(());
        }
        self.control.send_text(text).await
    }

    async fn answer_question(
        &mut self,
        chat: ChatId,
        question: &AskQuestionInfo,
        text: &str,
    ) -> Result<(), ControlError> {
        let control = self.control.as_ref();

        if let Ok(num) = text.trim().parse::<u32>() {
            if question.has_option(num) {
                info!(option = num, "Answering question");
                select_option(control, num, question.cursor_pos).await?;
                self.monitor.clear_pending_question();
                return Ok(());
            }
        }

        match question.type_option_num() {
            Some(type_num) => {
                info!(option = type_num, "Answering question with free text");
                select_option(control, type_num, question.cursor_pos).await?;
                tokio::time::sleep(TYPE_OPTION_DELAY).await;
                control.send_text(text).await?;
                self.monitor.clear_pending_question();
            }
            None => {
                self.notify(
                    chat,
                    Outbound::plain(notice::choose_one_of(&question.option_numbers())),
                );
            }
        }
        Ok(())
    }

    // ========== Session lifecycle ==========

    /// Create a session and wait for its prompt. `false` if creation failed.
    async fn start_session(&mut self, chat: ChatId) -> bool {
        let unattended = self.monitor.unattended();
        info!(unattended, "Starting assistant session");
        if let Err(e) = self.control.create_session(unattended).await {
            error!(error = %e, "Failed to create session");
            self.notify(chat, Outbound::markdown(notice::session_failed()));
            return false;
        }

        let ready = &self.config.ready;
        let control = self.control.as_ref();
        if !wait_for_ready(control, ready.timeout(), ready.interval()).await {
            self.notify(chat, Outbound::plain(notice::slow_start()));
            if !wait_for_ready(control, ready.timeout(), ready.interval()).await {
                warn!("Assistant still not ready, sending anyway");
            }
        }
        true
    }

    /// Destroy every session and forget all per-session state
    async fn teardown(&mut self) {
        if let Err(e) = self.control.destroy_all().await {
            warn!(error = %e, "Failed to destroy sessions");
        }
        self.monitor.reset();
    }

    fn notify(&self, chat: ChatId, item: Outbound) {
        self.outbox.send(chat, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReadyConfig;
    use crate::control::testing::{Call, FakeControl};
    use crate::control::Key;
    use crate::transport::testing::RecordingTransport;
    use crate::types::ActivityState;

    const QUESTION: &str = "Ready\n⏺ One decision first.\n\n☐ Database\n\nWhich database should we use?\n\n\
                            ❯ 1. Postgres\n  2. SQLite\n  3. Type something.\n\n\
                            Enter to select · ↑/↓ to navigate · Esc to cancel";

    fn relay(fake: &Arc<FakeControl>) -> (Relay, Arc<RecordingTransport>, tokio::task::JoinHandle<()>) {
        let transport = Arc::new(RecordingTransport::default());
        let (outbox, handle) = Outbox::spawn(transport.clone(), 4000);
        let config = RelayConfig {
            ready: ReadyConfig {
                timeout_ms: 40,
                interval_ms: 5,
            },
            ..RelayConfig::default()
        };
        (Relay::new(fake.clone(), outbox, config), transport, handle)
    }

    /// Drop the relay so the outbox drains, then collect what was delivered
    async fn delivered(
        relay: Relay,
        transport: &RecordingTransport,
        handle: tokio::task::JoinHandle<()>,
    ) -> Vec<String> {
        drop(relay);
        handle.await.unwrap();
        transport.texts().await
    }

    #[tokio::test]
    async fn test_poll_delivers_new_reply() {
        let fake = Arc::new(FakeControl::with_screen("Welcome\n\n❯"));
        let (mut relay, transport, handle) = relay(&fake);

        relay.handle(Inbound::command(7, Command::Start)).await;
        relay.poll().await;
        fake.push_capture("Welcome\n\n⏺ Here is the result:\nAll good.\n❯");
        for _ in 0..4 {
            relay.poll().await;
        }

        let texts = delivered(relay, &transport, handle).await;
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("🤖 *Relay active*"));
        assert_eq!(texts[1], "Here is the result:\nAll good.");
    }

    #[tokio::test]
    async fn test_unbound_relay_does_not_poll() {
        let fake = Arc::new(FakeControl::with_screen("⏺ Something\n❯"));
        let (mut relay, transport, handle) = relay(&fake);

        relay.poll().await;
        assert!(!relay.monitor().is_synced());
        assert!(delivered(relay, &transport, handle).await.is_empty());
    }

    #[tokio::test]
    async fn test_number_answers_pending_question() {
        let fake = Arc::new(FakeControl::with_screen("Ready\n❯"));
        let (mut relay, transport, handle) = relay(&fake);

        relay.bind(1);
        relay.poll().await;
        fake.push_capture(QUESTION);
        relay.poll().await;
        assert_eq!(relay.monitor().activity(), ActivityState::Asking);
        assert!(relay.monitor().pending_question().is_some());

        relay.handle(Inbound::text(1, "2")).await;
        assert_eq!(fake.calls(), vec![Call::Key(Key::Down), Call::Key(Key::Enter)]);
        assert!(relay.monitor().pending_question().is_none());

        let texts = delivered(relay, &transport, handle).await;
        assert!(texts.iter().any(|t| t.starts_with("❓ *Database*")));
    }

    #[tokio::test]
    async fn test_free_text_uses_type_option() {
        let fake = Arc::new(FakeControl::with_screen("Ready\n❯"));
        let (mut relay, _transport, _handle) = relay(&fake);

        relay.bind(1);
        relay.poll().await;
        fake.push_capture(QUESTION);
        relay.poll().await;

        relay.handle(Inbound::text(1, "Redis please")).await;
        assert_eq!(
            fake.calls(),
            vec![
                Call::Key(Key::Down),
                Call::Key(Key::Down),
                Call::Key(Key::Enter),
                Call::Text("Redis please".to_string()),
            ]
        );
        assert!(relay.monitor().pending_question().is_none());
    }

    #[tokio::test]
    async fn test_free_text_selects_printed_type_option() {
        let fake = Arc::new(FakeControl::with_screen("Ready\n❯"));
        let (mut relay, _transport, _handle) = relay(&fake);

        relay.bind(1);
        relay.poll().await;
        fake.push_capture(&QUESTION.replace("  3. Type something.", "  5. Type something."));
        relay.poll().await;

        relay.handle(Inbound::text(1, "Redis please")).await;
        let mut expected = vec![Call::Key(Key::Down); 4];
        expected.push(Call::Key(Key::Enter));
        expected.push(Call::Text("Redis please".to_string()));
        assert_eq!(fake.calls(), expected);
    }

    #[tokio::test]
    async fn test_invalid_number_lists_choices() {
        let fake = Arc::new(FakeControl::with_screen("Ready\n❯"));
        let (mut relay, transport, handle) = relay(&fake);

        relay.bind(1);
        relay.poll().await;
        fake.push_capture(&QUESTION.replace("  3. Type something.\n", ""));
        relay.poll().await;

        relay.handle(Inbound::text(1, "5")).await;
        assert!(fake.calls().is_empty());
        assert!(relay.monitor().pending_question().is_some());

        let texts = delivered(relay, &transport, handle).await;
        assert_eq!(texts.last().map(String::as_str), Some("⚠️ Choose one of: 1, 2"));
    }

    #[tokio::test]
    async fn test_permission_reply_clears_pending() {
        let fake = Arc::new(FakeControl::with_screen("Ready\n❯"));
        let (mut relay, transport, handle) = relay(&fake);

        relay.bind(1);
        relay.poll().await;
        fake.push_capture(
            "Ready\n⏺ Cleaning up.\n────────\n Bash command\n   rm -rf target\n Do you want to proceed?\n ❯ 1. Yes\n   2. No",
        );
        relay.poll().await;
        assert!(relay.monitor().pending_permission().is_some());

        relay.handle(Inbound::text(1, "1")).await;
        assert_eq!(fake.calls(), vec![Call::Text("1".to_string())]);
        assert!(relay.monitor().pending_permission().is_none());

        let texts = delivered(relay, &transport, handle).await;
        assert!(texts.iter().any(|t| t.starts_with("🔐 *Permission required*")));
    }

    #[tokio::test]
    async fn test_text_creates_missing_session() {
        let fake = Arc::new(FakeControl::default());
        *fake.ready_screen.lock().unwrap() = Some("Welcome\n❯".to_string());
        let (mut relay, transport, handle) = relay(&fake);

        relay.handle(Inbound::text(3, "hello")).await;
        assert_eq!(relay.chat(), Some(3));
        assert_eq!(
            fake.calls(),
            vec![Call::Create { unattended: false }, Call::Text("hello".to_string())]
        );
        assert!(delivered(relay, &transport, handle).await.is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_notifies_once() {
        let fake = Arc::new(FakeControl::default());
        *fake.fail_create.lock().unwrap() = true;
        let (mut relay, transport, handle) = relay(&fake);

        relay.handle(Inbound::text(3, "hello")).await;
        assert_eq!(fake.calls(), vec![Call::Create { unattended: false }]);

        let texts = delivered(relay, &transport, handle).await;
        assert_eq!(texts, vec![notice::session_failed()]);
    }

    #[tokio::test]
    async fn test_slow_start_still_sends_text() {
        let fake = Arc::new(FakeControl::default());
        let (mut relay, transport, handle) = relay(&fake);

        relay.handle(Inbound::text(3, "hello")).await;
        assert_eq!(
            fake.calls(),
            vec![Call::Create { unattended: false }, Call::Text("hello".to_string())]
        );

        let texts = delivered(relay, &transport, handle).await;
        assert_eq!(texts, vec![notice::slow_start()]);
    }

    #[tokio::test]
    async fn test_yolo_restarts_unattended() {
        let fake = Arc::new(FakeControl::with_screen("Welcome\n❯"));
        *fake.ready_screen.lock().unwrap() = Some("Welcome\n❯".to_string());
        let (mut relay, transport, handle) = relay(&fake);

        relay.handle(Inbound::command(5, Command::Yolo)).await;
        assert_eq!(fake.calls(), vec![Call::DestroyAll, Call::Create { unattended: true }]);
        assert!(relay.monitor().unattended());
        assert_eq!(relay.chat(), Some(5));

        let texts = delivered(relay, &transport, handle).await;
        assert_eq!(texts, vec![notice::unattended_enabled()]);
    }

    #[tokio::test]
    async fn test_stop_unbinds_and_resets() {
        let fake = Arc::new(FakeControl::with_screen("Ready\n❯"));
        let (mut relay, _transport, _handle) = relay(&fake);

        relay.handle(Inbound::command(5, Command::Start)).await;
        relay.poll().await;
        assert!(relay.monitor().is_synced());

        relay.handle(Inbound::command(5, Command::Stop)).await;
        assert_eq!(relay.chat(), None);
        assert!(!relay.monitor().is_synced());
        assert_eq!(fake.calls(), vec![Call::DestroyAll]);
    }

    #[tokio::test]
    async fn test_screen_command() {
        let fake = Arc::new(FakeControl::with_screen("\x1b[1mReady\x1b[0m\n❯\n\n"));
        let (mut relay, transport, handle) = relay(&fake);

        relay.handle(Inbound::command(5, Command::Screen)).await;
        fake.destroy_all().await.unwrap();
        relay.handle(Inbound::command(5, Command::Screen)).await;

        let delivered = {
            drop(relay);
            handle.await.unwrap();
            transport.delivered.lock().await.clone()
        };
        assert_eq!(
            delivered,
            vec![
                (5, "```\nReady\n❯\n```".to_string(), crate::transport::Formatting::Monospace),
                (5, notice::no_session(), crate::transport::Formatting::Plain),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_stops_when_inbound_closes() {
        let fake = Arc::new(FakeControl::with_screen("Ready\n❯"));
        let (relay, transport, handle) = relay(&fake);
        let (tx, rx) = mpsc::channel(8);

        let task = tokio::spawn(relay.run(rx));
        tx.send(Inbound::command(9, Command::Help)).await.unwrap();
        drop(tx);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
        handle.await.unwrap();

        assert_eq!(transport.texts().await, vec![notice::help()]);
    }
}
