use chrono::{DateTime, Utc};

use super::types::ReminderError;

pub(crate) fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub(crate) fn parse_datetime(value: &str) -> Result<DateTime<Utc>, ReminderError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Shortens `text` to `limit` characters. If the cut leaves an unclosed code
/// block (odd number of ``` fences), the last three characters are replaced
/// with the closing fence.
pub fn shorten_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    if cut.matches("```").count() % 2 != 0 {
        let keep = cut.chars().count().saturating_sub(3);
        cut = cut.chars().take(keep).collect();
        cut.push_str("```");
    }
    cut
}

/// Escapes Discord markdown in user-controlled display names.
pub(crate) fn escape_markdown(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for ch in name.chars() {
        if matches!(ch, '*' | '_' | '~' | '`' | '|' | '>' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
