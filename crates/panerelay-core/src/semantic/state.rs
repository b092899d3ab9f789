//! Activity classifier
//!
//! Assigns one [`ActivityState`] to a full snapshot by inspecting its tail.
//!
//! ## Detection Order
//!
//! Permission → Asking → Idle → Working. A dialog can be drawn while a stale
//! prompt glyph is still on screen, so dialogs are checked first.

use crate::types::{ActivityState, PlanChange};

use super::patterns::{
    first_match, has_response_glyph, is_footer_hint, is_navigation_footer, is_separator,
    strip_spinner_glyphs, PERMISSION_DIALOG_PATTERNS, PLAN_ENTERED_PATTERN, PLAN_EXITED_PATTERN,
    PROMPT_GLYPH, TAIL_LINES,
};

/// Last `n` non-blank lines, oldest first
pub(crate) fn non_blank_tail<S: AsRef<str>>(lines: &[S], n: usize) -> Vec<&str> {
    let mut tail: Vec<&str> = lines
        .iter()
        .rev()
        .map(|l| l.as_ref())
        .filter(|l| !l.trim().is_empty())
        .take(n)
        .collect();
    tail.reverse();
    tail
}

/// Spinner-stripped tail joined with newlines
pub(crate) fn permission_haystack<S: AsRef<str>>(lines: &[S]) -> String {
    strip_spinner_glyphs(&non_blank_tail(lines, TAIL_LINES).join("\n"))
}

pub fn is_permission_dialog<S: AsRef<str>>(lines: &[S]) -> bool {
    first_match(&PERMISSION_DIALOG_PATTERNS, &permission_haystack(lines)).is_some()
}

pub fn is_question_dialog<S: AsRef<str>>(lines: &[S]) -> bool {
    non_blank_tail(lines, TAIL_LINES)
        .iter()
        .any(|l| is_navigation_footer(l))
}

/// The last meaningful row shows a bare prompt.
///
/// Blank rows are skipped, and so are the separator rules and status hints
/// drawn around the input box.
fn is_idle<S: AsRef<str>>(lines: &[S]) -> bool {
    let last = lines.iter().rev().map(|l| l.as_ref().trim()).find(|l| {
        !l.is_empty() && !is_separator(l) && !is_footer_hint(l)
    });
    match last {
        Some(line) => line.contains(PROMPT_GLYPH) && !has_response_glyph(line),
        None => false,
    }
}

/// Classify a full snapshot. Total over arbitrary input.
pub fn classify<S: AsRef<str>>(lines: &[S]) -> ActivityState {
    if is_permission_dialog(lines) {
        ActivityState::Permission
    } else if is_question_dialog(lines) {
        ActivityState::Asking
    } else if is_idle(lines) {
        ActivityState::Idle
    } else {
        ActivityState::Working
    }
}

/// Most recent plan-mode marker among `lines`, scanning from the end
pub fn detect_plan_change<S: AsRef<str>>(lines: &[S]) -> Option<PlanChange> {
    lines.iter().rev().find_map(|line| {
        let line = line.as_ref();
        if PLAN_ENTERED_PATTERN.is_match(line) {
            Some(PlanChange::Entered)
        } else if PLAN_EXITED_PATTERN.is_match(line) {
            Some(PlanChange::Exited)
        } else {
            None
        }
    })
}
