//! User-visible notices
//!
//! All chat-facing wording lives here. Notices that embed pane text escape
//! the few characters the lightweight markup treats specially.

use crate::types::{ActivityState, AskQuestionInfo, PermissionInfo, PlanChange};

/// Escape `_`, `*`, backticks and `[` so pane text renders literally
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn permission(info: &PermissionInfo) -> String {
    let mut text = String::from("🔐 *Permission required*\n\n");
    if !info.context.trim().is_empty() {
        // keep the fence intact
        let context = info.context.replace("```", "'''");
        text.push_str(&format!("```\n{}\n```\n\n", context));
    }
    text.push_str("Reply with:\n");
    text.push_str("`1` → Yes (this time)\n");
    text.push_str("`2` → Yes, always\n");
    text.push_str("`3` → No");
    text
}

pub fn question(info: &AskQuestionInfo) -> String {
    let mut text = format!(
        "❓ *{}*\n\n{}\n",
        escape_markdown(&info.header),
        escape_markdown(&info.question)
    );
    for option in &info.options {
        text.push_str(&format!("\n`{}` → {}", option.num, escape_markdown(&option.label)));
        if let Some(description) = &option.description {
            text.push_str(&format!("\n      _{}_", escape_markdown(description)));
        }
    }
    text.push_str("\n\nReply with an option number");
    if info.has_type_option() {
        text.push_str(", or type your own answer");
    }
    text.push('.');
    text
}

pub fn plan(change: PlanChange) -> String {
    match change {
        PlanChange::Entered => "📋 *Plan mode on*: the assistant is planning before editing.".to_string(),
        PlanChange::Exited => "✅ *Plan mode off*: the assistant is carrying out the plan.".to_string(),
    }
}

pub fn choose_one_of(numbers: &[u32]) -> String {
    let list = numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("⚠️ Choose one of: {}", list)
}

pub fn session_failed() -> String {
    "❌ *Error*: could not start the terminal session.\n\nCheck that `tmux` is installed.".to_string()
}

pub fn slow_start() -> String {
    "⏳ The assistant is taking longer than expected to start. Your message will be sent as soon as it is ready.".to_string()
}

pub fn welcome(first_time: bool) -> String {
    if first_time {
        "🤖 *Relay active*\n\nSend a message and the assistant replies here.\n\n\
         `/restart` restart the assistant\n`/yolo` run without permission prompts\n`/help` all commands"
            .to_string()
    } else {
        "🤖 *Session active*\n\nYou can keep sending messages.".to_string()
    }
}

pub fn restarted() -> String {
    "🔄 Session ended. Send a message to start a new one.".to_string()
}

pub fn stopped() -> String {
    "🛑 Session stopped.".to_string()
}

pub fn unattended_enabled() -> String {
    "⚡ *Unattended mode on*\n\nThe assistant runs without asking for permission.\n\n⚠️ Every command will be executed automatically.".to_string()
}

pub fn no_session() -> String {
    "⚠️ No active session.".to_string()
}

pub fn empty_screen() -> String {
    "⚠️ The terminal is empty.".to_string()
}

pub fn status(session_alive: bool, state: ActivityState, in_plan_mode: bool, unattended: bool) -> String {
    let yes_no = |b: bool| if b { "on" } else { "off" };
    format!(
        "📊 *Status*\n\nSession: {}\nState: {}\nPlan mode: {}\nUnattended: {}",
        if session_alive { "running" } else { "stopped" },
        state,
        yes_no(in_plan_mode),
        yes_no(unattended)
    )
}

pub fn help() -> String {
    "🤖 *Commands*\n\n\
     `/start` bind this chat\n\
     `/restart` restart the assistant\n\
     `/yolo` restart without permission prompts ⚡\n\
     `/screen` show the terminal\n\
     `/status` show the relay state\n\
     `/stop` stop the assistant\n\
     `/help` this help\n\n\
     💡 Any other message goes straight to the assistant."
        .to_string()
}
