//! Semantic parsing of assistant terminal output
//!
//! Turns a normalised snapshot into an activity state plus the content and
//! dialogs worth relaying. Every function here is total: unexpected input
//! yields `None` or an empty list, never an error.

mod chrome;
mod confirm;
mod patterns;
mod question;
mod response;
mod state;

pub use chrome::{content_view, drop_echoed_input, trim_trailing_chrome, trim_trailing_dialog};
pub use confirm::{extract_permission, permission_fingerprint};
pub use patterns::{
    first_match, is_progress_text, NamedPattern, PERMISSION_DIALOG_PATTERNS, PROGRESS_PATTERNS,
    PROMPT_GLYPH, RESPONSE_GLYPHS, SPINNER_GLYPHS,
};
pub use question::extract_question;
pub use response::{clean_response, extract_responses, is_real_response, normalize_for_comparison};
pub use state::{classify, detect_plan_change, is_permission_dialog, is_question_dialog};
