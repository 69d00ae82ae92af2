use unicode_width::UnicodeWidthStr;

use crate::history::record::RollRecord;

fn emoji_emoji_presentation(s: &str) -> String {
    if s.chars().any(|c| c == '\u{FE0F}' || c == '\u{200D}') {
        s.to_string()
    } else {
        format!("{s}\u{FE0F}")
    }
}

fn pad_cells(s: &str, field_cells: usize) -> String {
    let w = s.width();
    let pad = field_cells.saturating_sub(w);
    format!("{s}{}", " ".repeat(pad))
}

pub fn format_emoji(emoji: &str, field_cells: usize) -> String {
    let e = emoji_emoji_presentation(emoji);
    pad_cells(&e, field_cells)
}

pub fn record_emoji(record: &RollRecord) -> &'static str {
    use crate::rules::conditions::Outcome;

    match record.outcome() {
        Some(Outcome::CriticalSuccess) => "🌟",
        Some(Outcome::CriticalFailure) => "💀",
        Some(Outcome::Success) => "✅",
        Some(Outcome::Failure) => "❌",
        None => "🎲",
    }
}

/// Renders a record as a single log line with an aligned emoji prefix.
pub fn log_line(context: &str, record: &RollRecord) -> String {
    let mut buf = format_emoji(record_emoji(record), 2);
    buf.push(' ');
    buf.push_str(context);
    buf.push_str(": ");
    record.pretty_print(&mut buf).ok();
    buf
}
