use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Longest message text kept on a countdown, in characters.
pub(crate) const MESSAGE_MAX_CHARS: usize = 1024;

/// A stored countdown event. Unlike reminders, countdowns carry no delivery
/// state; they only exist to be looked up and displayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownItem {
    pub idx: i64,
    /// Guild the countdown was created in, 0 for direct contexts.
    pub guild_id: u64,
    pub author_id: u64,
    /// Event name, unique per author.
    pub name: String,
    /// Link back to the message that created the countdown.
    pub permalink: Option<String>,
    pub message: Option<String>,
    pub origin_date: DateTime<Utc>,
    pub countdown_date: DateTime<Utc>,
}

impl CountdownItem {
    /// Time left until the event, `None` once it has finished.
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.countdown_date <= now {
            None
        } else {
            Some(self.countdown_date - now)
        }
    }

    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_none()
    }
}

/// Fields supplied by the caller when creating a countdown. The store
/// assigns `idx` and `origin_date` itself.
#[derive(Debug, Clone)]
pub struct NewCountdown {
    pub guild_id: u64,
    pub author_id: u64,
    pub name: String,
    pub message: Option<String>,
    pub countdown_date: DateTime<Utc>,
    pub permalink: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CountdownError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("datetime parse error: {0}")]
    DateTimeParse(#[from] chrono::ParseError),
    #[error("countdown date must be in the future")]
    CountdownDateInPast,
    #[error("countdown {0:?} already exists")]
    NameTaken(String),
    #[error("countdown {0} does not exist")]
    NotFound(i64),
}
