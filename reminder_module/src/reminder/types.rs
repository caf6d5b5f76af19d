use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest message text kept on a reminder, in characters.
pub const MESSAGE_MAX_CHARS: usize = 1024;

/// Delivery state of a reminder.
///
/// A reminder starts out `Waiting` and moves to exactly one of the terminal
/// states when its delivery is attempted. Rescheduling is the only way back
/// to `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderStatus {
    Waiting,
    Reminded,
    Failed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Waiting => "WAITING",
            ReminderStatus::Reminded => "REMINDED",
            ReminderStatus::Failed => "FAILED",
        }
    }

    /// True once no further automatic transition can happen.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReminderStatus::Waiting)
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderStatus {
    type Err = ReminderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "WAITING" => Ok(ReminderStatus::Waiting),
            "REMINDED" => Ok(ReminderStatus::Reminded),
            "FAILED" => Ok(ReminderStatus::Failed),
            other => Err(ReminderError::UnknownStatus(other.to_string())),
        }
    }
}

/// A stored reminder row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderItem {
    pub idx: i64,
    /// Guild the reminder was created in, 0 for direct contexts.
    pub guild_id: u64,
    pub author_id: u64,
    pub recipient_id: u64,
    /// Link back to the message that created the reminder.
    pub permalink: Option<String>,
    pub message: Option<String>,
    pub origin_date: DateTime<Utc>,
    pub remind_date: DateTime<Utc>,
    pub status: ReminderStatus,
}

/// Fields supplied by the caller when creating a reminder. The store assigns
/// `idx`, `origin_date` and the initial status itself.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub guild_id: u64,
    pub author_id: u64,
    pub recipient_id: u64,
    pub message: Option<String>,
    pub remind_date: DateTime<Utc>,
    pub permalink: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("datetime parse error: {0}")]
    DateTimeParse(#[from] chrono::ParseError),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("unknown reminder status {0:?} (allowed: WAITING, REMINDED, FAILED)")]
    UnknownStatus(String),
    #[error("remind date must be in the future")]
    RemindDateInPast,
    #[error("duration out of range")]
    DurationOutOfRange,
    #[error("reminder {0} does not exist")]
    NotFound(i64),
    #[error("not allowed to touch this reminder")]
    PermissionDenied,
}
