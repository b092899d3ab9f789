//! Session monitoring
//!
//! # Components
//!
//! - [`SessionMonitor`]: pure per-tick state machine over pane snapshots
//! - [`Relay`]: async driver wiring the monitor to control and transport
//! - [`Inbound`] / [`Command`]: messages arriving from the chat side
//! - `notice`: user-visible wording

mod dedup;
mod inbox;
pub mod notice;
mod relay;
mod session;

pub use dedup::SentResponses;
pub use inbox::{Command, Inbound, InboundKind};
pub use relay::Relay;
pub use session::{MonitorSettings, Observation, Phase, SessionMonitor};
