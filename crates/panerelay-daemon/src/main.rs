//! panerelay - relay daemon
//!
//! Drives a tmux-hosted assistant session from a console chat:
//! - stdin lines become chat messages (`/`-prefixed lines become commands)
//! - replies, dialog notices and typing indicators are printed to stdout
//!
//! Usage:
//!   panerelay
//!   panerelay --config ~/.panerelay/config.yaml --raw --json

mod console;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use panerelay_core::config::default_config_path;
use panerelay_core::{
    default_relay_home, ChatId, Command, DeliveryMode, Inbound, Outbox, Relay, RelayConfig,
    TmuxControl,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use console::ConsoleTransport;

const DEFAULT_CHAT_ID: ChatId = 1;

#[derive(Parser, Debug)]
#[command(name = "panerelay")]
#[command(about = "Relay a chat conversation to a tmux-hosted CLI assistant")]
#[command(version)]
struct Args {
    /// Config file (defaults to <home>/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start the assistant right away without permission prompts
    #[arg(long)]
    yolo: bool,

    /// Echo new pane content verbatim instead of extracted replies
    #[arg(long)]
    raw: bool,

    /// Chat id the console speaks as
    #[arg(long, default_value_t = DEFAULT_CHAT_ID)]
    chat_id: ChatId,

    /// Print outbound items as JSON lines
    #[arg(long)]
    json: bool,
}

fn log_filter() -> tracing_subscriber::EnvFilter {
    let level = if let Ok(v) = std::env::var("RUST_LOG") {
        v
    } else if let Ok(v) = std::env::var("PANERELAY_LOG_LEVEL") {
        match v.as_str() {
            "silent" => "off".to_string(),
            "fatal" => "error".to_string(),
            other => other.to_string(),
        }
    } else {
        "info".to_string()
    };

    tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

/// Forward stdin lines to the relay until EOF
async fn read_console(chat: ChatId, tx: mpsc::Sender<Inbound>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match Inbound::parse(chat, &line) {
                Some(inbound) => {
                    if tx.send(inbound).await.is_err() {
                        break;
                    }
                }
                None if line.trim().starts_with('/') => {
                    warn!(line = %line.trim(), "Unknown command, try /help");
                }
                None => {}
            },
            Ok(None) => {
                debug!("stdin closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let home = default_relay_home();

    // Dual-layer logging: stderr + file (daily rotation)
    let log_dir = home.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log dir {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "panerelay.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(log_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    // Default panic output only reaches stderr; keep a copy in the log file
    std::panic::set_hook(Box::new(|info| {
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_default();
        eprintln!("PANIC at {}: {}", location, payload);
        tracing::error!(location = %location, "RELAY PANIC: {}", payload);
    }));

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config = RelayConfig::load(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    if args.raw {
        config.delivery = DeliveryMode::Raw;
    }
    info!(
        home = %home.display(),
        session = %config.tmux.session,
        delivery = ?config.delivery,
        "panerelay starting"
    );

    let transport = Arc::new(ConsoleTransport::new(args.json));
    let (outbox, delivery) = Outbox::spawn(transport, config.transport.max_message_len);
    let control = Arc::new(TmuxControl::new(config.tmux.clone()));

    let mut relay = Relay::new(control, outbox, config);
    relay.bind(args.chat_id);

    let (tx, rx) = mpsc::channel(64);
    if args.yolo {
        tx.send(Inbound::command(args.chat_id, Command::Yolo))
            .await
            .context("Relay inbound channel closed")?;
    }
    tokio::spawn(read_console(args.chat_id, tx));

    tokio::select! {
        _ = relay.run(rx) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    // Relay dropped: let queued messages drain
    if tokio::time::timeout(Duration::from_secs(2), delivery).await.is_err() {
        warn!("Outbox did not drain in time");
    }
    info!("panerelay stopped");
    Ok(())
}
