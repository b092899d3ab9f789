//! Outbound chunking
//!
//! Chat transports cap message length. Plain and marked-up text is split at
//! paragraph boundaries; monospace echoes are split at line boundaries with
//! every chunk wrapped in its own fence. Lengths are counted in chars.

use super::Formatting;

/// Fence around a monospace block
pub const MONOSPACE_FENCE: &str = "```";

/// `<fence>\n` + `\n<fence>` around a monospace chunk
pub const MONOSPACE_WRAPPER_LEN: usize = 8;

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Break one piece into char runs of at most `budget`
fn hard_split(piece: &str, budget: usize) -> Vec<String> {
    if char_len(piece) <= budget {
        return vec![piece.to_string()];
    }
    let chars: Vec<char> = piece.chars().collect();
    chars
        .chunks(budget.max(1))
        .map(|run| run.iter().collect())
        .collect()
}

/// Greedily join pieces with `sep` into chunks of at most `budget` chars
fn pack<'a>(pieces: impl IntoIterator<Item = &'a str>, sep: &str, budget: usize) -> Vec<String> {
    let sep_len = char_len(sep);
    let mut chunks = Vec::new();
    let mut current: Option<(String, usize)> = None;

    for piece in pieces {
        for part in hard_split(piece, budget) {
            let part_len = char_len(&part);
            current = match current.take() {
                Some((mut text, len)) if len + sep_len + part_len <= budget => {
                    text.push_str(sep);
                    text.push_str(&part);
                    Some((text, len + sep_len + part_len))
                }
                Some((text, _)) => {
                    chunks.push(text);
                    Some((part, part_len))
                }
                None => Some((part, part_len)),
            };
        }
    }

    if let Some((text, _)) = current {
        chunks.push(text);
    }
    chunks
}

/// Split `text` into deliverable chunks no longer than `max_len`
pub fn split_message(text: &str, formatting: Formatting, max_len: usize) -> Vec<String> {
    match formatting {
        Formatting::Monospace => {
            let body_budget = max_len.saturating_sub(MONOSPACE_WRAPPER_LEN).max(1);
            let body = text.trim_end();
            if body.trim().is_empty() {
                return Vec::new();
            }
            pack(body.lines(), "\n", body_budget)
                .into_iter()
                .map(|chunk| format!("{MONOSPACE_FENCE}\n{chunk}\n{MONOSPACE_FENCE}"))
                .collect()
        }
        Formatting::Plain | Formatting::Markdown => {
            let text = text.trim();
            if text.is_empty() {
                return Vec::new();
            }
            if char_len(text) <= max_len {
                return vec![text.to_string()];
            }
            pack(text.split("\n\n"), "\n\n", max_len.max(1))
                .into_iter()
                .map(|chunk| chunk.trim().to_string())
                .filter(|chunk| !chunk.is_empty())
                .collect()
        }
    }
}
