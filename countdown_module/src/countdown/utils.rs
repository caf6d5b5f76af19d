use chrono::{DateTime, Utc};

use super::types::CountdownError;

pub(crate) fn format_datetime(value: DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub(crate) fn parse_datetime(value: &str) -> Result<DateTime<Utc>, CountdownError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Shortens `text` to `limit` characters, closing a code block the cut would
/// otherwise leave open.
pub(crate) fn shorten_message(text: &str, limit: usize) -> String {
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
