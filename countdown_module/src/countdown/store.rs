use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use super::types::{CountdownError, CountdownItem, NewCountdown, MESSAGE_MAX_CHARS};
use super::utils::{format_datetime, parse_datetime, shorten_message};

const COUNTDOWN_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS countdowns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    guild_id INTEGER NOT NULL DEFAULT 0,
    author_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    permalink TEXT,
    message TEXT,
    origin_date TEXT NOT NULL,
    countdown_date TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS countdowns_author_name ON countdowns (author_id, name);
"#;

/// Independently combinable filters for [`SqliteCountdownStore::query`]. All
/// set fields must match; date bounds are inclusive.
#[derive(Debug, Default, Clone)]
pub struct CountdownFilter {
    pub guild_id: Option<u64>,
    pub author_id: Option<u64>,
    pub min_origin_date: Option<DateTime<Utc>>,
    pub max_origin_date: Option<DateTime<Utc>>,
    pub min_countdown_date: Option<DateTime<Utc>>,
    pub max_countdown_date: Option<DateTime<Utc>>,
}

/// SQLite-backed countdown table.
#[derive(Debug, Clone)]
pub struct SqliteCountdownStore {
    path: PathBuf,
}

impl SqliteCountdownStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, CountdownError> {
        let store = Self { path: path.into() };
        let _ = store.open()?;
        Ok(store)
    }

    /// Persists a new countdown. Names are unique per author and the event
    /// date must lie in the future.
    pub fn insert(&self, new: NewCountdown) -> Result<CountdownItem, CountdownError> {
        let origin_date = Utc::now();
        if new.countdown_date <= origin_date {
            return Err(CountdownError::CountdownDateInPast);
        }
        if self.get(new.author_id, &new.name)?.is_some() {
            return Err(CountdownError::NameTaken(new.name));
        }

        let message = new
            .message
            .map(|text| shorten_message(&text, MESSAGE_MAX_CHARS));
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO countdowns (guild_id, author_id, name, permalink, message, origin_date, countdown_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                new.guild_id as i64,
                new.author_id as i64,
                new.name,
                new.permalink.as_deref(),
                message.as_deref(),
                format_datetime(origin_date),
                format_datetime(new.countdown_date),
            ],
        )?;

        let item = CountdownItem {
            idx: conn.last_insert_rowid(),
            guild_id: new.guild_id,
            author_id: new.author_id,
            name: new.name,
            permalink: new.permalink,
            message,
            origin_date,
            countdown_date: new.countdown_date,
        };
        debug!(idx = item.idx, name = %item.name, "countdown created");
        Ok(item)
    }

    /// Looks up one countdown by its author and name.
    pub fn get(&self, author_id: u64, name: &str) -> Result<Option<CountdownItem>, CountdownError> {
        let conn = self.open()?;
        let row = conn
            .query_row(
                "SELECT id, guild_id, author_id, name, permalink, message, origin_date, countdown_date
                 FROM countdowns
                 WHERE author_id = ?1 AND name = ?2",
                params![author_id as i64, name],
                map_row,
            )
            .optional()?;
        row.map(raw_to_item).transpose()
    }

    /// Returns matching countdowns ordered by event date, latest first.
    pub fn query(&self, filter: &CountdownFilter) -> Result<Vec<CountdownItem>, CountdownError> {
        let mut sql = String::from(
            "SELECT id, guild_id, author_id, name, permalink, message, origin_date, countdown_date
             FROM countdowns",
        );
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(guild_id) = filter.guild_id {
            clauses.push(format!("guild_id = ?{}", values.len() + 1));
            values.push(Box::new(guild_id as i64));
        }
        if let Some(author_id) = filter.author_id {
            clauses.push(format!("author_id = ?{}", values.len() + 1));
            values.push(Box::new(author_id as i64));
        }
        if let Some(min) = filter.min_origin_date {
            clauses.push(format!("origin_date >= ?{}", values.len() + 1));
            values.push(Box::new(format_datetime(min)));
        }
        if let Some(max) = filter.max_origin_date {
            clauses.push(format!("origin_date <= ?{}", values.len() + 1));
            values.push(Box::new(format_datetime(max)));
        }
        if let Some(min) = filter.min_countdown_date {
            clauses.push(format!("countdown_date >= ?{}", values.len() + 1));
            values.push(Box::new(format_datetime(min)));
        }
        if let Some(max) = filter.max_countdown_date {
            clauses.push(format!("countdown_date <= ?{}", values.len() + 1));
            values.push(Box::new(format_datetime(max)));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY countdown_date DESC");

        let conn = self.open()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(values.iter().map(|value| value.as_ref())),
            map_row,
        )?;

        let mut items = Vec::new();
        for row in rows {
            items.push(raw_to_item(row?)?);
        }
        Ok(items)
    }

    pub fn delete(&self, idx: i64) -> Result<(), CountdownError> {
        let conn = self.open()?;
        let changed = conn.execute("DELETE FROM countdowns WHERE id = ?1", params![idx])?;
        if changed == 0 {
            return Err(CountdownError::NotFound(idx));
        }
        debug!(idx, "countdown deleted");
        Ok(())
    }

    fn open(&self) -> Result<Connection, CountdownError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(COUNTDOWN_SCHEMA)?;
        Ok(conn)
    }
}

type RawRow = (
    i64,
    i64,
    i64,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get::<_, i64>(0)?,
        row.get::<_, i64>(1)?,
        row.get::<_, i64>(2)?,
        row.get::<_, String>(3)?,
        row.get::<_, Option<String>>(4)?,
        row.get::<_, Option<String>>(5)?,
        row.get::<_, String>(6)?,
        row.get::<_, String>(7)?,
    ))
}

fn raw_to_item(raw: RawRow) -> Result<CountdownItem, CountdownError> {
    let (idx, guild_id, author_id, name, permalink, message, origin_raw, countdown_raw) = raw;
    Ok(CountdownItem {
        idx,
        guild_id: guild_id as u64,
        author_id: author_id as u64,
        name,
        permalink,
        message,
        origin_date: parse_datetime(&origin_raw)?,
        countdown_date: parse_datetime(&countdown_raw)?,
    })
}
