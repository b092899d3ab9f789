//! Session Monitor - per-session state machine
//!
//! One [`SessionMonitor::observe`] call per poll tick. The monitor is pure and
//! synchronous: it owns every piece of per-session state (cursor, dedup
//! memory, outstanding dialogs, stability counter) and returns the outbound
//! events for the tick instead of sending them.
//!
//! ## Phases
//!
//! ```text
//! Unsynced --first snapshot--> Synced --session missing--> Unsynced
//! ```
//!
//! The first snapshot after (re)sync is the baseline: everything on it counts
//! as already seen.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::{DeliveryMode, RelayConfig};
use crate::pane::{DiffTracker, Snapshot};
use crate::semantic::{
    classify, content_view, detect_plan_change, drop_echoed_input, extract_permission,
    extract_question, extract_responses, trim_trailing_chrome,
};
use crate::transport::Outbound;
use crate::types::{ActivityState, AskQuestionInfo, PermissionInfo, PlanChange};

use super::dedup::SentResponses;
use super::notice;

// ========== Types ==========

/// Tunables taken from [`RelayConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub stability_ticks: u32,
    pub typing_throttle: Duration,
    pub delivery: DeliveryMode,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from_config(&RelayConfig::default())
    }
}

impl MonitorSettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            stability_ticks: config.stability_ticks,
            typing_throttle: config.typing_throttle(),
            delivery: config.delivery,
        }
    }
}

/// Result of one capture attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The controlled session does not exist
    Missing,
    /// Raw pane capture
    Captured(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unsynced,
    Synced,
}

// ========== Monitor ==========

#[derive(Debug)]
pub struct SessionMonitor {
    settings: MonitorSettings,
    phase: Phase,
    tracker: DiffTracker,
    sent: SentResponses,
    last_text: Option<String>,
    stable: u32,
    flushed: bool,
    last_typing: Option<Instant>,
    activity: ActivityState,
    pending_permission: Option<PermissionInfo>,
    pending_question: Option<AskQuestionInfo>,
    in_plan_mode: bool,
    unattended: bool,
}

impl SessionMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self {
            settings,
            phase: Phase::Unsynced,
            tracker: DiffTracker::new(),
            sent: SentResponses::default(),
            last_text: None,
            stable: 0,
            flushed: true,
            last_typing: None,
            activity: ActivityState::Idle,
            pending_permission: None,
            pending_question: None,
            in_plan_mode: false,
            unattended: false,
        }
    }

    /// Process one poll tick
    pub fn observe(&mut self, observation: Observation, now: Instant) -> Vec<Outbound> {
        let raw = match observation {
            Observation::Missing => {
                if self.phase == Phase::Synced {
                    info!("Controlled session gone, waiting for a new one");
                }
                self.phase = Phase::Unsynced;
                return Vec::new();
            }
            Observation::Captured(raw) => raw,
        };

        let snapshot = Snapshot::from_raw(&raw);
        match self.phase {
            Phase::Unsynced => {
                self.sync(&snapshot);
                Vec::new()
            }
            Phase::Synced => self.tick(&snapshot, now),
        }
    }

    /// Accept `snapshot` as the baseline without notifying anyone
    fn sync(&mut self, snapshot: &Snapshot) {
        let lines = snapshot.lines();
        let state = classify(lines);

        let mut indexed = 0;
        if self.settings.delivery == DeliveryMode::Extracted {
            for response in extract_responses(lines) {
                if self.sent.insert(&response) {
                    indexed += 1;
                }
            }
        }

        self.tracker.resync(content_view(lines, state));
        self.last_text = Some(snapshot.text().to_string());
        self.stable = 0;
        self.flushed = true;
        self.activity = state;
        self.phase = Phase::Synced;
        info!(lines = lines.len(), indexed, state = %state, "Monitor synced");
    }

    fn tick(&mut self, snapshot: &Snapshot, now: Instant) -> Vec<Outbound> {
        let mut out = Vec::new();
        let lines = snapshot.lines();

        let changed = self.last_text.as_deref() != Some(snapshot.text());
        if changed {
            self.stable = 0;
            self.flushed = false;
            self.last_text = Some(snapshot.text().to_string());
            let due = self.last_typing.map_or(true, |at| {
                now.saturating_duration_since(at) >= self.settings.typing_throttle
            });
            if due {
                self.last_typing = Some(now);
                out.push(Outbound::Typing);
            }
        } else {
            self.stable = self.stable.saturating_add(1);
        }

        let state = classify(lines);
        let previous = self.activity;
        if state != previous {
            info!(previous = %previous, next = %state, "Activity changed");
        }

        // Markers are looked up before any flush below moves the cursor
        let plan_change = if changed {
            let view = content_view(lines, state);
            self.tracker.realign(view);
            detect_plan_change(self.tracker.pending(view))
        } else {
            None
        };

        if state == ActivityState::Permission && previous != ActivityState::Permission && !self.unattended {
            self.flush(lines, state, &mut out);
            if self.pending_permission.is_none() {
                if let Some(permission) = extract_permission(lines) {
                    info!(fingerprint = %permission.fingerprint, "Permission requested");
                    out.push(Outbound::markdown(notice::permission(&permission)));
                    self.pending_permission = Some(permission);
                }
            }
        }
        if previous == ActivityState::Permission && state != ActivityState::Permission {
            self.pending_permission = None;
        }

        if state == ActivityState::Asking && previous != ActivityState::Asking {
            self.flush(lines, state, &mut out);
            if self.pending_question.is_none() {
                if let Some(question) = extract_question(lines) {
                    info!(header = %question.header, options = question.options.len(), "Question asked");
                    out.push(Outbound::markdown(notice::question(&question)));
                    self.pending_question = Some(question);
                }
            }
        }
        if previous == ActivityState::Asking && state != ActivityState::Asking {
            self.pending_question = None;
        }

        match plan_change {
            Some(PlanChange::Entered) if !self.in_plan_mode => {
                self.flush(lines, state, &mut out);
                self.in_plan_mode = true;
                info!("Plan mode entered");
                out.push(Outbound::markdown(notice::plan(PlanChange::Entered)));
            }
            Some(PlanChange::Exited) if self.in_plan_mode => {
                self.flush(lines, state, &mut out);
                self.in_plan_mode = false;
                info!("Plan mode exited");
                out.push(Outbound::markdown(notice::plan(PlanChange::Exited)));
            }
            _ => {}
        }

        self.activity = state;

        if self.stable >= self.settings.stability_ticks && !self.flushed {
            self.flush(lines, state, &mut out);
        }

        out
    }

    /// Deliver new content once per content window
    fn flush(&mut self, lines: &[String], state: ActivityState, out: &mut Vec<Outbound>) {
        if self.flushed {
            return;
        }
        self.flushed = true;

        let view = content_view(lines, state);
        self.tracker.realign(view);
        let delta = self.tracker.advance(view);
        if delta.is_empty() {
            return;
        }

        let before = out.len();
        match self.settings.delivery {
            DeliveryMode::Extracted => {
                for response in extract_responses(delta.lines) {
                    // recorded even if delivery later fails: at-most-once
                    if self.sent.insert(&response) {
                        out.push(Outbound::plain(response));
                    }
                }
            }
            DeliveryMode::Raw => {
                let span = trim_trailing_chrome(drop_echoed_input(delta.lines));
                if span.iter().any(|l| !l.trim().is_empty()) {
                    out.push(Outbound::monospace(span.join("\n")));
                }
            }
        }
        debug!(
            new_lines = delta.lines.len(),
            delivered = out.len() - before,
            "Flushed new content"
        );
    }

    // ========== Narrow accessors for inbound handling ==========

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_synced(&self) -> bool {
        self.phase == Phase::Synced
    }

    pub fn activity(&self) -> ActivityState {
        self.activity
    }

    pub fn in_plan_mode(&self) -> bool {
        self.in_plan_mode
    }

    pub fn unattended(&self) -> bool {
        self.unattended
    }

    pub fn set_unattended(&mut self, unattended: bool) {
        self.unattended = unattended;
    }

    pub fn pending_question(&self) -> Option<&AskQuestionInfo> {
        self.pending_question.as_ref()
    }

    /// The user answered the outstanding question
    pub fn clear_pending_question(&mut self) {
        self.pending_question = None;
    }

    pub fn pending_permission(&self) -> Option<&PermissionInfo> {
        self.pending_permission.as_ref()
    }

    /// The user answered the outstanding permission dialog
    pub fn clear_pending_permission(&mut self) {
        self.pending_permission = None;
    }

    /// Number of replies remembered as delivered
    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }

    /// Session teardown: back to initial state, next poll resyncs
    pub fn reset(&mut self) {
        let settings = self.settings;
        *self = Self::new(settings);
        debug!("Monitor reset");
    }
}
