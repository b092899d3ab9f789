//! Permission dialog extractor
//!
//! Locates the confirmation line of a permission dialog and captures the few
//! lines above it that describe the requested action. The fingerprint is
//! derived from that context only, so spinner frames redrawn between polls do
//! not produce a new dialog identity.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::PermissionInfo;

use super::patterns::{
    first_match, is_permission_question_line, is_separator, PERMISSION_DIALOG_PATTERNS,
    PROMPT_GLYPH,
};
use super::state::permission_haystack;

const FINGERPRINT_PREFIX: &str = "perm:";
const FINGERPRINT_MAX_CHARS: usize = 200;
const CONTEXT_LINES: usize = 4;

static NUMBERED_OPTION_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").unwrap());

/// Lines that describe the action rather than the dialog's own controls
fn is_context_line(line: &str) -> bool {
    !line.starts_with("Esc ")
        && !line.starts_with(PROMPT_GLYPH)
        && !NUMBERED_OPTION_PATTERN.is_match(line)
        && !is_separator(line)
}

/// Stable identity of a permission dialog
pub fn permission_fingerprint(context: &str) -> String {
    let head: String = context.chars().take(FINGERPRINT_MAX_CHARS).collect();
    format!("{}{}", FINGERPRINT_PREFIX, head)
}

/// Extract the visible permission dialog, if any
pub fn extract_permission<S: AsRef<str>>(lines: &[S]) -> Option<PermissionInfo> {
    let haystack = permission_haystack(lines);
    first_match(&PERMISSION_DIALOG_PATTERNS, &haystack)?;

    let clean: Vec<&str> = haystack
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_separator(l))
        .collect();

    let context = clean
        .iter()
        .position(|l| is_permission_question_line(l))
        .map(|idx| {
            clean[idx.saturating_sub(CONTEXT_LINES)..idx]
                .iter()
                .copied()
                .filter(|l| is_context_line(l))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    Some(PermissionInfo {
        fingerprint: permission_fingerprint(&context),
        context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_context(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    fn bash_dialog(spinner: &str) -> Vec<String> {
        make_context(&[
            "⏺ I'll clean the build output.",
            "",
            format!("{} Bash(rm -rf target)", spinner).as_str(),
            "────────────────────────",
            " Bash command",
            "   rm -rf target",
            "   Remove build artifacts",
            " Do you want to proceed?",
            " ❯ 1. Yes",
            "   2. Yes, and don't ask again for rm commands",
            "   3. No, and tell Claude what to do differently (esc)",
            "",
        ])
    }

    #[test]
    fn test_extracts_context_before_question() {
        let info = extract_permission(&bash_dialog("⠋")).unwrap();
        assert_eq!(
            info.context,
            "Bash(rm -rf target)\nBash command\nrm -rf target\nRemove build artifacts"
        );
        assert_eq!(info.fingerprint, format!("perm:{}", info.context));
    }

    #[test]
    fn test_fingerprint_stable_under_spinner_churn() {
        let a = extract_permission(&bash_dialog("⠋")).unwrap();
        let b = extract_permission(&bash_dialog("⠹")).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_controls_excluded_from_context() {
        let lines = make_context(&[
            "Esc to cancel",
            "❯ previous input",
            "1. earlier option",
            "Edit src/main.rs",
            "Allow this edit?",
        ]);
        let info = extract_permission(&lines).unwrap();
        assert_eq!(info.context, "Edit src/main.rs");
    }

    #[test]
    fn test_no_dialog() {
        let lines = make_context(&["⏺ All done.", "❯ "]);
        assert!(extract_permission(&lines).is_none());
    }

    #[test]
    fn test_fingerprint_truncated() {
        let long = "x".repeat(500);
        assert_eq!(permission_fingerprint(&long).chars().count(), 5 + 200);
    }
}
