//! Terminal message styling for the CLI wrapper.
//!
//! Grounded in the teacher's `styling/constants.rs` emoji+`color-print` message
//! functions, trimmed down to what a one-line-per-repository summary needs —
//! no table rendering, syntax highlighting, or hyperlinks.

use color_print::cformat;

use crate::model::StatusCode;

pub const SUCCESS_EMOJI: &str = "✅";
pub const ERROR_EMOJI: &str = "❌";
pub const WARNING_EMOJI: &str = "🟡";
pub const HINT_EMOJI: &str = "💡";
pub const INFO_EMOJI: &str = "⚪";

pub fn success_message(content: impl AsRef<str>) -> String {
    cformat!("{SUCCESS_EMOJI} <green>{}</>", content.as_ref())
}

pub fn error_message(content: impl AsRef<str>) -> String {
    cformat!("{ERROR_EMOJI} <red>{}</>", content.as_ref())
}

pub fn warning_message(content: impl AsRef<str>) -> String {
    cformat!("{WARNING_EMOJI} <yellow>{}</>", content.as_ref())
}

pub fn hint_message(content: impl AsRef<str>) -> String {
    cformat!("{HINT_EMOJI} <dim>{}</>", content.as_ref())
}

/// The emoji a [`StatusCode`] renders with in a one-line-per-repository summary.
pub fn status_emoji(status: StatusCode) -> &'static str {
    use StatusCode::*;
    match status {
        Error => ERROR_EMOJI,
        Canceled => ERROR_EMOJI,
        Conflict | RebaseInProgress | MergeInProgress | Dirty => WARNING_EMOJI,
        WouldFetch | WouldPull | WouldPush | WouldUpdate | WouldSwitch | WouldClone | WouldStash | WouldTag
        | WouldCleanup | WouldCommit => HINT_EMOJI,
        _ => SUCCESS_EMOJI,
    }
}

/// Render one neutral summary line for a repository result: `<emoji> <rel_path>  <status>[: message]`.
pub fn format_summary_line(rel_path: &str, status: StatusCode, message: Option<&str>) -> String {
    let emoji = status_emoji(status);
    match message {
        Some(msg) if !msg.is_empty() => format!("{emoji} {rel_path}  {status}: {msg}"),
        _ => format!("{emoji} {rel_path}  {status}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_uses_the_error_emoji() {
        assert_eq!(status_emoji(StatusCode::Error), ERROR_EMOJI);
    }

    #[test]
    fn dry_run_statuses_use_the_hint_emoji() {
        assert_eq!(status_emoji(StatusCode::WouldPull), HINT_EMOJI);
    }

    #[test]
    fn summary_line_omits_the_colon_when_there_is_no_message() {
        let line = format_summary_line("repos/a", StatusCode::UpToDate, None);
        assert_eq!(line, format!("{SUCCESS_EMOJI} repos/a  up-to-date"));
    }

    #[test]
    fn summary_line_includes_the_message_when_present() {
        let line = format_summary_line("repos/a", StatusCode::Error, Some("network unreachable"));
        assert_eq!(line, format!("{ERROR_EMOJI} repos/a  error: network unreachable"));
    }
}
