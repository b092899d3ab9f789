//! Diff Tracker - cursor over already-processed pane lines
//!
//! The cursor counts lines from the start of the current line sequence that
//! were already handed to extraction. Invariant: `0 <= cursor <= lines.len()`
//! for the sequence it was last applied to. When the pane history shrinks
//! below the cursor (scroll buffer trimmed, screen cleared) the cursor is
//! clamped down to the new length and nothing is reported as new.
//!
//! Once the scrollback is full the capture keeps a constant length and new
//! output pushes old lines off the top. [`DiffTracker::realign`] handles that
//! case: it looks for the last processed lines (the anchor) at or above the
//! old cursor and moves the cursor to just after them.

use tracing::debug;

/// Processed lines remembered to find the cursor again after a scroll
const ANCHOR_LINES: usize = 3;

/// New lines reported by one `advance` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineDelta<'a> {
    /// `lines[start..]` of the sequence passed in
    pub lines: &'a [String],
    /// Index of the first new line
    pub start: usize,
    /// Cursor after the call
    pub next_cursor: usize,
    /// Whether the cursor had to be clamped because the sequence shrank
    pub clamped: bool,
}

impl<'a> LineDelta<'a> {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiffTracker {
    cursor: usize,
    anchor: Vec<String>,
}

impl DiffTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn remember_anchor(&mut self, lines: &[String]) {
        let end = self.cursor.min(lines.len());
        self.anchor = lines[end.saturating_sub(ANCHOR_LINES)..end].to_vec();
    }

    /// Treat everything currently visible as already seen
    pub fn resync(&mut self, lines: &[String]) {
        debug!(lines = lines.len(), "Diff tracker resynced");
        self.cursor = lines.len();
        self.remember_anchor(lines);
    }

    /// Forget all progress (session teardown)
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.anchor.clear();
    }

    /// Move the cursor back over lines that scrolled off the top.
    ///
    /// Returns the number of lines the cursor moved back. Zero when the
    /// anchor is still right before the cursor or cannot be found.
    pub fn realign(&mut self, lines: &[String]) -> usize {
        let k = self.anchor.len();
        if k == 0 {
            return 0;
        }
        let top = self.cursor.min(lines.len());
        if top >= k && lines[top - k..top] == self.anchor[..] && top == self.cursor {
            return 0;
        }

        // Whole anchor at or above the cursor, else its tail at the very top
        // of the view when the rest of it scrolled away
        let found = (k..=top)
            .rev()
            .find(|&p| lines[p - k..p] == self.anchor[..])
            .or_else(|| {
                (1..k.min(lines.len() + 1)).rev().find(|&j| {
                    let tail = &self.anchor[k - j..];
                    lines[..j] == tail[..] && tail.iter().any(|l| !l.trim().is_empty())
                })
            });
        match found {
            Some(p) if p < self.cursor => {
                let shift = self.cursor - p;
                debug!(shift, cursor = p, "Pane scrolled, cursor realigned");
                self.cursor = p;
                shift
            }
            _ => 0,
        }
    }

    /// Report `lines[cursor..]` and move the cursor to the end
    pub fn advance<'a>(&mut self, lines: &'a [String]) -> LineDelta<'a> {
        if self.cursor > lines.len() {
            debug!(
                cursor = self.cursor,
                lines = lines.len(),
                "Line history shrank below cursor, clamping"
            );
            self.cursor = lines.len();
            self.remember_anchor(lines);
            return LineDelta {
                lines: &lines[lines.len()..],
                start: lines.len(),
                next_cursor: self.cursor,
                clamped: true,
            };
        }

        let start = self.cursor;
        self.cursor = lines.len();
        self.remember_anchor(lines);
        LineDelta {
            lines: &lines[start..],
            start,
            next_cursor: self.cursor,
            clamped: false,
        }
    }

    /// Lines that `advance` would report, without moving the cursor
    pub fn pending<'a>(&self, lines: &'a [String]) -> &'a [String] {
        let start = self.cursor.min(lines.len());
        &lines[start..]
    }
}
