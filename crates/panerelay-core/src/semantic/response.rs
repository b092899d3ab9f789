//! Response extractor
//!
//! Pulls assistant-authored reply segments out of a line span and cleans
//! their cosmetic formatting for chat delivery.
//!
//! # Components
//!
//! - [`extract_responses`]: segment scanner (start glyph → end marker)
//! - [`clean_response`]: border, indentation and emoji-spacing cleanup
//! - [`is_real_response`]: rejects fragments and tool noise
//! - [`normalize_for_comparison`]: dedup key for sent responses

use once_cell::sync::Lazy;
use regex::Regex;

use super::patterns::{
    after_response_glyph, is_progress_text, is_separator, is_spinner_run, is_spinner_status,
    is_tool_invocation, PROMPT_GLYPH,
};

const MIN_RESPONSE_CHARS: usize = 5;

static TABLE_GLYPH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[┌┐└┘├┤┬┴┼╋┏┓┗┛┣┫┳┻╂]").unwrap());

/// Decorative rows: rules, shading, spinner frames, bullets, ascii dashes
static BORDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s─━═░▒▓█▀▄╭╮╰╯⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏◐◓◑◒●○◉◎⏺\-_=~`]*$").unwrap()
});

static SIDE_BORDER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[│┃]\s*|\s*[│┃]$").unwrap());

static MULTI_SPACE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());

static BLANK_RUN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

static EMOJI_LEAD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\p{Emoji_Presentation}|\p{Emoji}\x{FE0F})").unwrap());

static NOISE_ONLY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s\p{P}\p{S}\p{Emoji_Presentation}\x{FE0F}\x{200D}]*$").unwrap()
});

/// Row of a rendered table: junction glyphs, or `│ a │ b │` with inner columns
fn is_table_line(line: &str) -> bool {
    if TABLE_GLYPH_PATTERN.is_match(line) {
        return true;
    }
    let trimmed = line.trim();
    let starts = trimmed.starts_with(['│', '┃']);
    let ends = trimmed.ends_with(['│', '┃']);
    starts && ends && trimmed.matches(['│', '┃']).count() >= 3
}

fn is_border_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && (BORDER_PATTERN.is_match(trimmed) || is_spinner_run(trimmed))
}

fn is_emoji_led(line: &str) -> bool {
    EMOJI_LEAD_PATTERN.is_match(line)
}

/// Reply continuation rows are indented, so an unindented tool call is not part of one
fn ends_segment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(PROMPT_GLYPH)
        || is_separator(trimmed)
        || is_spinner_status(trimmed)
        || (!line.starts_with(char::is_whitespace) && is_tool_invocation(trimmed))
}

/// Clean the cosmetic formatting of one captured segment
pub fn clean_response(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();

    for raw in text.lines() {
        if is_table_line(raw) {
            out.push(raw.trim_end().to_string());
            continue;
        }
        if is_border_line(raw) {
            continue;
        }

        let unboxed = SIDE_BORDER_PATTERN.replace_all(raw.trim(), "");
        let line = MULTI_SPACE_PATTERN
            .replace_all(unboxed.trim(), " ")
            .into_owned();

        if is_emoji_led(&line) {
            let needs_gap = out
                .last()
                .map_or(false, |prev| !prev.trim().is_empty() && !is_emoji_led(prev));
            if needs_gap {
                out.push(String::new());
            }
        }
        out.push(line);
    }

    BLANK_RUN_PATTERN
        .replace_all(&out.join("\n"), "\n\n")
        .trim()
        .to_string()
}

/// Whether a cleaned segment is worth delivering
pub fn is_real_response(cleaned: &str) -> bool {
    let trimmed = cleaned.trim();
    if trimmed.chars().count() < MIN_RESPONSE_CHARS {
        return false;
    }
    if NOISE_ONLY_PATTERN.is_match(trimmed) {
        return false;
    }
    let first_line = trimmed.lines().next().unwrap_or_default();
    !is_progress_text(first_line)
}

/// Whitespace-collapsed, case-folded form used as a dedup key
pub fn normalize_for_comparison(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

struct SegmentCollector<'a> {
    buffer: Vec<&'a str>,
    capturing: bool,
    responses: Vec<String>,
}

impl<'a> SegmentCollector<'a> {
    fn start(&mut self, first: &'a str) {
        self.flush();
        if is_progress_text(first) {
            return;
        }
        self.capturing = true;
        self.buffer.push(first);
    }

    fn flush(&mut self) {
        if self.capturing {
            let cleaned = clean_response(&self.buffer.join("\n"));
            let key = normalize_for_comparison(&cleaned);
            let duplicate = self
                .responses
                .iter()
                .any(|r| normalize_for_comparison(r) == key);
            if is_real_response(&cleaned) && !duplicate {
                self.responses.push(cleaned);
            }
        }
        self.buffer.clear();
        self.capturing = false;
    }
}

/// Scan `lines` for reply segments, in order of appearance
pub fn extract_responses<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut collector = SegmentCollector {
        buffer: Vec::new(),
        capturing: false,
        responses: Vec::new(),
    };

    for line in lines {
        let line = line.as_ref();
        if let Some(rest) = after_response_glyph(line) {
            collector.start(rest);
            continue;
        }
        if !collector.capturing {
            continue;
        }
        if ends_segment(line) {
            collector.flush();
            continue;
        }
        collector.buffer.push(line);
    }

    collector.flush();
    collector.responses
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_context(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_response_until_prompt() {
        let lines = make_context(&[
            "❯ check it",
            "⏺ Here is the result:",
            "  All good.",
            "",
            "❯ ",
        ]);
        assert_eq!(extract_responses(&lines), vec!["Here is the result:\nAll good."]);
    }

    #[test]
    fn test_tool_call_segment_dropped() {
        let lines = make_context(&["⏺ Bash(ls -la)", "  ⎿  Cargo.toml", "     src"]);
        assert!(extract_responses(&lines).is_empty());
    }

    #[test]
    fn test_multiple_segments_in_order() {
        let lines = make_context(&[
            "⏺ Let me look at the build first.",
            "⏺ Read(Cargo.toml)",
            "  ⎿  Read 40 lines",
            "⏺ The build uses the 2021 edition.",
            "────────────────",
        ]);
        assert_eq!(
            extract_responses(&lines),
            vec!["Let me look at the build first.", "The build uses the 2021 edition."]
        );
    }

    #[test]
    fn test_replies_opening_with_tool_verbs_kept() {
        let lines = make_context(&[
            "⏺ Ran the full test suite and all 42 tests pass.",
            "❯",
            "⏺ Found 3 issues in the parser, explained below.",
            "  1. The lexer drops trailing commas",
            "❯",
            "⏺ Read 12 lines (ctrl+r to expand)",
            "❯",
        ]);
        assert_eq!(
            extract_responses(&lines),
            vec![
                "Ran the full test suite and all 42 tests pass.",
                "Found 3 issues in the parser, explained below.\n1. The lexer drops trailing commas",
            ]
        );
    }

    #[test]
    fn test_duplicates_collapse_within_call() {
        let lines = make_context(&["⏺ Same answer here", "❯", "⏺ same   answer here", "❯"]);
        assert_eq!(extract_responses(&lines), vec!["Same answer here"]);
    }

    #[test]
    fn test_short_and_noise_segments_rejected() {
        let lines = make_context(&["⏺ ok", "❯", "⏺ ✅ !!", "❯", "● --- ...", "❯"]);
        assert!(extract_responses(&lines).is_empty());
    }

    #[test]
    fn test_tool_invocation_ends_segment() {
        let lines = make_context(&["⏺ Working on it", "Bash(pwd)", "  ⎿  /home/user"]);
        assert_eq!(extract_responses(&lines), vec!["Working on it"]);

        let lines = make_context(&["⏺ Wrap the value:", "  Some(value) is returned"]);
        assert_eq!(extract_responses(&lines), vec!["Wrap the value:\nSome(value) is returned"]);
    }

    #[test]
    fn test_spinner_status_ends_segment() {
        let lines = make_context(&["⏺ Working through the list", "✻ Pondering… (4s)"]);
        assert_eq!(extract_responses(&lines), vec!["Working through the list"]);
    }

    #[test]
    fn test_clean_strips_borders_and_indentation() {
        let text = "╭──────────╮\n│  Summary   of   changes │\n╰──────────╯\n    indented   line";
        assert_eq!(clean_response(text), "Summary of changes\nindented line");
    }

    #[test]
    fn test_clean_preserves_tables() {
        let text = "Results:\n  ┌─────┬─────┐\n  │ a   │ b   │\n  └─────┴─────┘";
        assert_eq!(
            clean_response(text),
            "Results:\n  ┌─────┬─────┐\n  │ a   │ b   │\n  └─────┴─────┘"
        );
    }

    #[test]
    fn test_clean_emoji_spacing() {
        let text = "Summary\n✅ Tests pass\n🚀 Deployed";
        assert_eq!(clean_response(text), "Summary\n\n✅ Tests pass\n🚀 Deployed");
    }

    #[test]
    fn test_clean_collapses_blank_runs() {
        let text = "First\n\n\n\n\nSecond\n\nThird";
        assert_eq!(clean_response(text), "First\n\nSecond\n\nThird");
    }

    #[test]
    fn test_is_real_response() {
        assert!(is_real_response("Hello there"));
        assert!(!is_real_response("Hi!"));
        assert!(!is_real_response("🎉🎉🎉🎉🎉"));
        assert!(!is_real_response("Bash(cargo build)\nerror"));
        assert!(is_real_response("Mentions Bash(ls) later"));
    }

    #[test]
    fn test_normalize_for_comparison() {
        assert_eq!(normalize_for_comparison("  Hello\n  World  "), "hello world");
    }
}
