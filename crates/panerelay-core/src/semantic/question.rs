//! Structured question extractor
//!
//! Parses the multiple-choice dialog drawn above a navigation footer:
//!
//! ```text
//! ←  ☐ Database  →
//!
//! Which database should the service use?
//!
//! ❯ 1. Postgres
//!      Managed, replicated
//!   2. SQLite
//!   3. Type something.
//! ──────────────────────
//! Enter to select · ↑/↓ to navigate · Esc to cancel
//! ```
//!
//! Option numbers are kept exactly as printed so a numeric reply maps
//! straight back to a terminal option.

use crate::types::{AskOption, AskQuestionInfo};

use super::patterns::{
    has_checkbox_glyph, is_navigation_footer, is_option_list_rule, CHECKBOX_GLYPHS,
    DESCRIPTION_INDENT_PATTERN, NUMBERED_LINE_PATTERN, OPTION_LINE_PATTERN, TYPE_OPTION_PATTERN,
};

/// Visible header text after the checkbox glyph
fn header_text(line: &str) -> String {
    let after = line
        .find(CHECKBOX_GLYPHS)
        .map(|idx| {
            let glyph_len = line[idx..].chars().next().map_or(0, char::len_utf8);
            &line[idx + glyph_len..]
        })
        .unwrap_or(line);
    after.trim().trim_end_matches('→').trim().to_string()
}

fn is_first_option(line: &str) -> bool {
    OPTION_LINE_PATTERN.is_match(line)
}

/// Extract the question above the most recent navigation footer
pub fn extract_question<S: AsRef<str>>(lines: &[S]) -> Option<AskQuestionInfo> {
    let lines: Vec<&str> = lines.iter().map(|l| l.as_ref()).collect();

    let footer_idx = lines.iter().rposition(|l| is_navigation_footer(l))?;
    let header_idx = lines[..footer_idx]
        .iter()
        .rposition(|l| has_checkbox_glyph(l))?;
    let header = header_text(lines[header_idx]);

    let first_opt_idx = (header_idx + 1..footer_idx).find(|&i| is_first_option(lines[i]))?;

    let question = lines[header_idx + 1..first_opt_idx]
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if question.is_empty() {
        return None;
    }

    let mut options = Vec::new();
    let mut type_option = None;
    let mut cursor_pos = 1;
    let mut i = first_opt_idx;

    while i < footer_idx {
        let line = lines[i];
        if is_option_list_rule(line) {
            break;
        }

        if let Some(caps) = OPTION_LINE_PATTERN.captures(line) {
            let num: u32 = match caps[2].parse() {
                Ok(n) => n,
                Err(_) => {
                    i += 1;
                    continue;
                }
            };
            let label = caps[3].trim().to_string();
            if caps.get(1).is_some() {
                cursor_pos = num;
            }

            if TYPE_OPTION_PATTERN.is_match(&label) {
                type_option = Some(num);
                i += 1;
                continue;
            }

            let mut option = AskOption::new(num, label);
            if let Some(next) = lines.get(i + 1).filter(|_| i + 1 < footer_idx) {
                if DESCRIPTION_INDENT_PATTERN.is_match(next) && !NUMBERED_LINE_PATTERN.is_match(next) {
                    option.description = Some(next.trim().to_string());
                    i += 1;
                }
            }
            options.push(option);
        }
        i += 1;
    }

    if options.is_empty() {
        return None;
    }

    Some(AskQuestionInfo {
        header,
        question,
        options,
        type_option,
        cursor_pos,
    })
}
