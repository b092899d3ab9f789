//! Chrome trimmer
//!
//! Removes terminal decoration around content that is forwarded verbatim or
//! tracked by the line cursor:
//!
//! - trailing chrome: input box rules, bare prompt, hints, spinner frames and
//!   the spinner status row, all redrawn in place
//! - trailing dialog: a permission or question dialog rendered separately
//! - leading echoed input: `❯ what the user typed`

use crate::types::ActivityState;

use super::patterns::{
    has_checkbox_glyph, is_confirmation_line, is_echoed_input, is_esc_hint, is_footer_hint,
    is_navigation_footer, is_separator, is_spinner_run, is_spinner_status, PROMPT_GLYPH,
    TAIL_LINES,
};

fn is_chrome(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || is_separator(trimmed)
        || trimmed.strip_prefix(PROMPT_GLYPH) == Some("")
        || is_footer_hint(trimmed)
        || is_esc_hint(trimmed)
        || is_spinner_run(trimmed)
        || is_spinner_status(trimmed)
}

/// Drop trailing blank, separator, prompt, hint and spinner rows.
///
/// The spinner status row (`✻ Thinking… (3s)`) is overwritten by the next
/// reply, so it must never sit before the line cursor.
pub fn trim_trailing_chrome<S: AsRef<str>>(lines: &[S]) -> &[S] {
    let end = lines
        .iter()
        .rposition(|l| !is_chrome(l.as_ref()))
        .map_or(0, |idx| idx + 1);
    &lines[..end]
}

/// Cut an interactive dialog off the end of a span.
///
/// A permission dialog is cut at the start of the separator block above its
/// confirmation line; a structured question is cut at its checkbox header.
/// Only the last rows of the span are searched for the dialog itself.
pub fn trim_trailing_dialog<S: AsRef<str>>(lines: &[S]) -> &[S] {
    let window_start = lines.len().saturating_sub(TAIL_LINES);

    let confirm_idx = (window_start..lines.len())
        .rev()
        .find(|&i| is_confirmation_line(lines[i].as_ref().trim()));

    if let Some(confirm_idx) = confirm_idx {
        let mut cut = None;
        for i in (0..confirm_idx).rev() {
            if is_separator(lines[i].as_ref().trim()) {
                cut = Some(i);
            } else if cut.is_some() {
                break;
            }
        }
        if let Some(cut) = cut {
            return &lines[..cut];
        }
    }

    let footer_idx = (window_start..lines.len())
        .rev()
        .find(|&i| is_navigation_footer(lines[i].as_ref()));
    if let Some(footer_idx) = footer_idx {
        if let Some(header_idx) = (0..footer_idx).rev().find(|&i| has_checkbox_glyph(lines[i].as_ref())) {
            return &lines[..header_idx];
        }
    }

    lines
}

/// Drop echoed user input, and blank rows around it, from the front of a span
pub fn drop_echoed_input<S: AsRef<str>>(lines: &[S]) -> &[S] {
    let start = lines
        .iter()
        .map(|l| l.as_ref())
        .position(|l| !is_echoed_input(l) && !l.trim().is_empty())
        .unwrap_or(lines.len());
    &lines[start..]
}

/// The part of a snapshot that only ever grows at the bottom.
///
/// The input box and any dialog are redrawn in place, so they are cut off
/// before the line cursor is applied.
pub fn content_view<S: AsRef<str>>(lines: &[S], state: ActivityState) -> &[S] {
    let view = trim_trailing_chrome(lines);
    if state.is_dialog() {
        trim_trailing_chrome(trim_trailing_dialog(view))
    } else {
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_context(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_trailing_chrome_exhaustive() {
        let lines = make_context(&["some output", "──────", "❯", ""]);
        assert_eq!(trim_trailing_chrome(&lines), &lines[..1]);
    }

    #[test]
    fn test_trailing_chrome_hints_and_spinners() {
        let lines = make_context(&[
            "result",
            "⠙",
            "────",
            "❯ ",
            "────",
            "  ? for shortcuts",
            "  Esc to interrupt",
        ]);
        assert_eq!(trim_trailing_chrome(&lines), &lines[..1]);
    }

    #[test]
    fn test_trailing_spinner_status_trimmed() {
        let lines = make_context(&[
            "⏺ Entered plan mode",
            "  Exploring",
            "✻ Thinking… (2s · esc to interrupt)",
            "",
            "────",
            "❯",
            "────",
        ]);
        assert_eq!(trim_trailing_chrome(&lines), &lines[..2]);
        assert_eq!(content_view(&lines, ActivityState::Idle), &lines[..2]);
    }

    #[test]
    fn test_trailing_chrome_keeps_content() {
        let lines = make_context(&["❯ typed text"]);
        assert_eq!(trim_trailing_chrome(&lines), &lines[..]);
        let empty: Vec<String> = make_context(&["", "❯"]);
        assert!(trim_trailing_chrome(&empty).is_empty());
    }

    #[test]
    fn test_trailing_permission_dialog_cut() {
        let lines = make_context(&[
            "⏺ Bash(cargo clean)",
            "",
            "────────────────",
            "════════════════",
            " Bash command",
            "   cargo clean",
            " Do you want to proceed?",
            " ❯ 1. Yes",
            "   2. No",
        ]);
        assert_eq!(trim_trailing_dialog(&lines), &lines[..2]);
    }

    #[test]
    fn test_trailing_question_cut() {
        let lines = make_context(&[
            "⏺ A quick question first.",
            "☐ Scope",
            "Which crates?",
            "❯ 1. All",
            "Enter to select · ↑/↓ to navigate · Esc to cancel",
        ]);
        assert_eq!(trim_trailing_dialog(&lines), &lines[..1]);
    }

    #[test]
    fn test_no_dialog_unchanged() {
        let lines = make_context(&["⏺ plain text", "more"]);
        assert_eq!(trim_trailing_dialog(&lines), &lines[..]);
    }

    #[test]
    fn test_drop_echoed_input() {
        let lines = make_context(&["", "❯ fix it", "❯ please", "", "⏺ On it."]);
        assert_eq!(drop_echoed_input(&lines), &lines[4..]);
    }

    #[test]
    fn test_content_view_idle_and_dialog() {
        let idle = make_context(&["Welcome", "", "❯"]);
        assert_eq!(content_view(&idle, ActivityState::Idle).len(), 1);

        let dialog = make_context(&[
            "⏺ Bash(ls)",
            "────────",
            "Do you want to proceed?",
            "❯ 1. Yes",
        ]);
        assert_eq!(content_view(&dialog, ActivityState::Permission), &dialog[..1]);
        assert_eq!(content_view(&dialog, ActivityState::Working).len(), 4);
    }
}
