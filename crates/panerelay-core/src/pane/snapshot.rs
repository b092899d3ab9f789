//! Snapshot normaliser
//!
//! Strips escape and control sequences from a raw pane capture. Printable
//! Unicode (box drawing, emoji, the glyphs the classifier keys on) survives.

use once_cell::sync::Lazy;
use regex::Regex;

/// CSI sequences (colors, cursor movement, private modes)
static CSI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").unwrap());

/// OSC sequences terminated by BEL or ST (window titles, hyperlinks)
static OSC_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\x1b\].*?(?:\x07|\x1b\\)").unwrap());

/// Charset designation (`ESC ( B`) and two-byte escapes (`ESC =`, `ESC 7`)
static SHORT_ESCAPE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b(?:[()*+][0-9A-Za-z]|[=>78DEHMc])").unwrap());

/// Remaining C0 controls and DEL; keeps `\t`, `\n` and `\r`
static CONTROL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0b\x0c\x0e-\x1f\x7f]").unwrap());

/// Remove escape/control sequences, leaving printable text and newlines
pub fn strip_ansi(raw: &str) -> String {
    let text = OSC_PATTERN.replace_all(raw, "");
    let text = CSI_PATTERN.replace_all(&text, "");
    let text = SHORT_ESCAPE_PATTERN.replace_all(&text, "");
    CONTROL_PATTERN.replace_all(&text, "").into_owned()
}

/// Normalise a raw capture into ordered plain lines
pub fn normalize(raw: &str) -> Vec<String> {
    split_lines(&strip_ansi(raw))
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// One normalised capture of the pane
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    text: String,
    lines: Vec<String>,
}

impl Snapshot {
    pub fn from_raw(raw: &str) -> Self {
        let text = strip_ansi(raw);
        let lines = split_lines(&text);
        Self { text, lines }
    }

    /// Normalised text, used for change detection between polls
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_colors_and_cursor_movement() {
        let raw = "\x1b[1;32m⏺\x1b[0m Hello\x1b[K\n\x1b[?25l❯ \x1b[?25h";
        assert_eq!(strip_ansi(raw), "⏺ Hello\n❯ ");
    }

    #[test]
    fn test_strip_osc_title_and_hyperlink() {
        let raw = "\x1b]0;claude\x07text \x1b]8;;https://x.y\x1b\\link\x1b]8;;\x1b\\";
        assert_eq!(strip_ansi(raw), "text link");
    }

    #[test]
    fn test_strip_controls_keeps_unicode() {
        let raw = "\x1b(B╭──╮ ✻ ☐ 🚀\x07\x08\x00";
        assert_eq!(strip_ansi(raw), "╭──╮ ✻ ☐ 🚀");
    }

    #[test]
    fn test_normalize_splits_lines() {
        let lines = normalize("a\r\n\x1b[31mb\x1b[0m\n\nc");
        assert_eq!(lines, vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_snapshot_text_matches_lines() {
        let snap = Snapshot::from_raw("\x1b[2mone\x1b[0m\ntwo");
        assert_eq!(snap.text(), "one\ntwo");
        assert_eq!(snap.lines(), &["one".to_string(), "two".to_string()]);
        assert!(!snap.is_blank());
        assert!(Snapshot::from_raw("\x1b[0m \n ").is_blank());
    }
}
