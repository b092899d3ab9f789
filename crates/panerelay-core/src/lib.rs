//! panerelay-core - terminal snapshot interpretation engine
//!
//! Relays a chat conversation to an interactive CLI assistant that only exists
//! as a terminal UI, by reconstructing semantic events from plain-text pane
//! snapshots.
//!
//! # Pipeline
//!
//! ```text
//! raw capture -> pane::snapshot -> pane::diff -> semantic::* -> monitor -> transport
//! ```
//!
//! - `pane`: normalisation of raw captures and the processed-line cursor
//! - `semantic`: activity classification and content/dialog extraction
//! - `monitor`: the per-session state machine, inbound commands and the async driver
//! - `control` / `transport`: the process-control and chat-delivery seams

pub mod config;
pub mod control;
pub mod error;
pub mod monitor;
pub mod pane;
pub mod semantic;
pub mod transport;
pub mod types;

pub use config::{default_relay_home, DeliveryMode, RelayConfig};
pub use control::{select_option, wait_for_ready, SessionControl, TmuxControl};
pub use error::{ConfigError, ControlError, TransportError};
pub use monitor::{Command, Inbound, InboundKind, MonitorSettings, Observation, Relay, SessionMonitor};
pub use pane::{normalize, DiffTracker};
pub use semantic::{
    classify, detect_plan_change, extract_permission, extract_question, extract_responses,
};
pub use transport::{split_message, Formatting, Outbound, Outbox, Transport};
pub use types::*;
