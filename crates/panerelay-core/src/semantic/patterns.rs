//! Pattern tables for the assistant's terminal UI
//!
//! Every heuristic the parsers rely on lives here as an ordered, named table
//! so it can be tested and extended without touching control flow.
//!
//! ## TUI layout being parsed
//!
//! ```text
//! ⏺ Reply text from the assistant          (response-start glyph)
//!   continuation lines...
//! ⏺ Bash(cargo test)                        (tool call, not a reply)
//!   ⎿  test result: ok                      (tool result continuation)
//! ✻ Pondering… (12s · thinking)             (spinner line)
//! ────────────────────                      (separator)
//! ❯                                         (interactive prompt)
//! ────────────────────
//!   ? for shortcuts                         (hint)
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Interactive prompt glyph: the assistant is idle and awaiting input
pub const PROMPT_GLYPH: char = '❯';

/// Response-start glyphs: the assistant begins a reply segment
pub const RESPONSE_GLYPHS: &[char] = &['⏺', '●'];

/// Spinner animation frames (braille, quarter circles, star frames)
pub const SPINNER_GLYPHS: &[char] = &[
    '⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏', '◐', '◓', '◑', '◒', '·', '✻', '✽',
    '✶', '✳', '✢',
];

/// Header glyphs of a structured question tab
pub const CHECKBOX_GLYPHS: &[char] = &['☐', '☒'];

/// Number of trailing lines inspected for dialogs
pub const TAIL_LINES: usize = 30;

/// A regex with a stable name, for diagnostics and tests
#[derive(Debug)]
pub struct NamedPattern {
    pub name: &'static str,
    pub regex: Regex,
}

impl NamedPattern {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
        }
    }
}

/// Name of the first pattern in `table` matching `text`
pub fn first_match(table: &[NamedPattern], text: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|p| p.regex.is_match(text))
        .map(|p| p.name)
}

// ========== Progress / tool-call noise ==========

/// Text after a response-start glyph that marks tool activity, not a reply
pub static PROGRESS_PATTERNS: Lazy<Vec<NamedPattern>> = Lazy::new(|| {
    vec![
        // Bash(ls -la), Read(src/main.rs), Update(Cargo.toml), Task(...)
        NamedPattern::new("tool_call", r"^[A-Z][A-Za-z0-9_]*\("),
        // github - create_issue (MCP)
        NamedPattern::new("mcp_tool_call", r"\(MCP\)"),
        // Read 120 lines, Wrote 3 lines to notes.md, Updated src/a.rs with 2 additions
        NamedPattern::new(
            "file_operation",
            r"(?i)^(?:read|wrote)\s+\d+\s+lines?\b(?:\s+to\s+\S+)?\s*(?:\(.*\))?$|^(?i:updated|edited)\s+\S+\s+with\s+\d+\s+(?:additions?|removals?)\b",
        ),
        // Running…, Searched for 2 patterns, Found 4 files, Listed 3 paths
        NamedPattern::new(
            "search_execution",
            r"(?i)^(?:running|searching|fetching|listing|reading|writing)(?:…|\.\.\.)?\s*(?:\(.*\))?$|^(?i:searched\s+for)\s+\d+\s+patterns?\b|^(?i:found|listed)\s+\d+\s+(?:files?|matches|lines?|paths?|results?)\s*(?:\(.*\))?$",
        ),
        NamedPattern::new("todo_update", r"(?i)^updated?\s+todos\b"),
        NamedPattern::new("tool_result", r"^⎿"),
        NamedPattern::new("tool_batch", r"(?i)^\+\d+\s+more\s+tool\s+uses?"),
        NamedPattern::new("expand_hint", r"(?i)\(ctrl\+[or]\s+to\s+expand\)"),
        NamedPattern::new("plan_mode", r"(?i)^(?:entered|exited)\s+plan\s+mode"),
        NamedPattern::new("plan_approval", r"(?i)^user\s+approved\b.*\bplan\b"),
    ]
});

/// Whether reply text is actually tool/progress noise
pub fn is_progress_text(text: &str) -> bool {
    first_match(&PROGRESS_PATTERNS, text.trim()).is_some()
}

/// Bare tool invocation such as `Bash(pwd)` or an MCP call
pub fn is_tool_invocation(text: &str) -> bool {
    matches!(
        first_match(&PROGRESS_PATTERNS, text.trim()),
        Some("tool_call" | "mcp_tool_call")
    )
}

// ========== Dialog phrases ==========

/// Any of these in the spinner-stripped tail means a permission dialog
pub static PERMISSION_DIALOG_PATTERNS: Lazy<Vec<NamedPattern>> = Lazy::new(|| {
    vec![
        NamedPattern::new("proceed_confirmation", r"Do you want to proceed\?"),
        NamedPattern::new("run_request", r"want to run"),
        NamedPattern::new("numbered_yes_no", r"(?i)\d+\.\s*(?:Yes|No|Oui|Non)\b"),
        NamedPattern::new("allow_phrase", r"\bAllow\b"),
        NamedPattern::new("yes_no_token", r"(?i)\(y/n\)|\(yes/no\)"),
    ]
});

/// Line carrying the confirmation question itself
pub static CONFIRMATION_LINE_PATTERNS: Lazy<Vec<NamedPattern>> = Lazy::new(|| {
    vec![
        NamedPattern::new("proceed_confirmation", r"Do you want to proceed\?"),
        NamedPattern::new("run_request", r"want to run"),
        NamedPattern::new("yes_no_token", r"(?i)\(y/n\)|\(yes/no\)"),
    ]
});

static ALLOW_LINE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bAllow\b").unwrap());

/// Confirmation line, excluding the looser "Allow" phrase
pub fn is_confirmation_line(line: &str) -> bool {
    first_match(&CONFIRMATION_LINE_PATTERNS, line).is_some()
}

/// Confirmation line or an "Allow ..." request line
pub fn is_permission_question_line(line: &str) -> bool {
    is_confirmation_line(line) || ALLOW_LINE_PATTERN.is_match(line)
}

/// Footer of a navigable option list
pub fn is_navigation_footer(line: &str) -> bool {
    line.contains("Enter to select") && line.contains("to navigate")
}

pub fn has_checkbox_glyph(line: &str) -> bool {
    line.contains(CHECKBOX_GLYPHS)
}

/// `❯ 2. Label` with optional cursor glyph
pub static OPTION_LINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(❯)?\s*(\d+)\.\s+(.+)").unwrap());

/// Any numbered line, used to stop description capture
pub static NUMBERED_LINE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*❯?\s*\d+\.").unwrap());

/// Free-text escape hatch of a structured question
pub static TYPE_OPTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^type\s+something").unwrap());

/// Description lines are indented under their option
pub static DESCRIPTION_INDENT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s{4,}\S").unwrap());

// ========== Chrome ==========

static SEPARATOR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[─━═]+$").unwrap());

static RULE_WITH_GAPS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[─\s]{3,}$").unwrap());

static SHORTCUTS_HINT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\?\s+for shortcuts").unwrap());

static ESC_HINT_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Esc\s").unwrap());

/// Pure separator rule (`────`), already trimmed
pub fn is_separator(trimmed: &str) -> bool {
    SEPARATOR_PATTERN.is_match(trimmed)
}

/// Horizontal rule closing an option list
pub fn is_option_list_rule(line: &str) -> bool {
    RULE_WITH_GAPS_PATTERN.is_match(line.trim()) && line.contains("────")
}

pub fn is_shortcuts_hint(trimmed: &str) -> bool {
    SHORTCUTS_HINT_PATTERN.is_match(trimmed)
}

pub fn is_esc_hint(trimmed: &str) -> bool {
    ESC_HINT_PATTERN.is_match(trimmed)
}

static MODE_HINT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(shift\+tab to cycle\)").unwrap());

/// Status rows drawn below the input box (`? for shortcuts`, mode toggles)
pub fn is_footer_hint(trimmed: &str) -> bool {
    is_shortcuts_hint(trimmed) || MODE_HINT_PATTERN.is_match(trimmed)
}

/// Non-empty run made only of spinner frames
pub fn is_spinner_run(trimmed: &str) -> bool {
    !trimmed.is_empty()
        && trimmed.contains(SPINNER_GLYPHS)
        && strip_spinner_glyphs(trimmed).trim().is_empty()
}

/// Spinner status row such as `✻ Pondering… (12s)`
pub fn is_spinner_status(trimmed: &str) -> bool {
    SPINNER_STATUS_PATTERN.is_match(trimmed)
}

static SPINNER_STATUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let frames: String = SPINNER_GLYPHS
        .iter()
        .filter(|c| **c != '·')
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    Regex::new(&format!(r"^[{}]\s+\S", frames)).unwrap()
});

pub fn strip_spinner_glyphs(text: &str) -> String {
    text.chars().filter(|c| !SPINNER_GLYPHS.contains(c)).collect()
}

pub fn has_response_glyph(text: &str) -> bool {
    text.contains(RESPONSE_GLYPHS)
}

/// Text following a leading response-start glyph, if the line starts with one
pub fn after_response_glyph(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let first = trimmed.chars().next()?;
    if RESPONSE_GLYPHS.contains(&first) {
        Some(trimmed[first.len_utf8()..].trim())
    } else {
        None
    }
}

/// `❯ some text`: echoed user input
pub fn is_echoed_input(line: &str) -> bool {
    line.trim_start()
        .strip_prefix(PROMPT_GLYPH)
        .map_or(false, |rest| !rest.trim().is_empty())
}

// ========== Plan mode ==========

pub static PLAN_ENTERED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Entered plan mode").unwrap());

pub static PLAN_EXITED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Exited plan mode").unwrap());
