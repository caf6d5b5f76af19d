use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, ToSql};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::types::{NewReminder, ReminderError, ReminderItem, ReminderStatus};
use super::utils::{format_datetime, parse_datetime};

const REMINDER_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reminders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    guild_id INTEGER NOT NULL DEFAULT 0,
    author_id INTEGER NOT NULL,
    recipient_id INTEGER NOT NULL,
    permalink TEXT,
    message TEXT,
    origin_date TEXT NOT NULL,
    remind_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'WAITING'
);

CREATE INDEX IF NOT EXISTS reminders_due ON reminders (status, remind_date);
"#;

fn ensure_reminder_columns(conn: &Connection) -> Result<(), ReminderError> {
    let mut stmt = conn.prepare("PRAGMA table_info(reminders)")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    let mut columns = HashSet::new();
    for row in rows {
        columns.insert(row?);
    }

    if !columns.contains("permalink") {
        conn.execute("ALTER TABLE reminders ADD COLUMN permalink TEXT", [])?;
    }
    Ok(())
}

/// Independently combinable filters for [`SqliteReminderStore::query`]. All
/// set fields must match; date bounds are inclusive.
#[derive(Debug, Default, Clone)]
pub struct ReminderFilter {
    pub guild_id: Option<u64>,
    pub idx: Option<i64>,
    pub recipient_id: Option<u64>,
    pub status: Option<ReminderStatus>,
    pub min_origin_date: Option<DateTime<Utc>>,
    pub max_origin_date: Option<DateTime<Utc>>,
    pub min_remind_date: Option<DateTime<Utc>>,
    pub max_remind_date: Option<DateTime<Utc>>,
}

/// SQLite-backed reminder table. The store owns every row; callers always
/// work on fetched copies and write them back through [`update`].
///
/// [`update`]: SqliteReminderStore::update
#[derive(Debug, Clone)]
pub struct SqliteReminderStore {
    path: PathBuf,
}

impl SqliteReminderStore {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, ReminderError> {
        let store = Self { path: path.into() };
        let _ = store.open()?;
        Ok(store)
    }

    /// Persists a new reminder. The origin date is assigned here, never taken
    /// from the caller, and the remind date must lie strictly after it.
    pub fn insert(&self, new: NewReminder) -> Result<ReminderItem, ReminderError> {
        let origin_date = Utc::now();
        if new.remind_date <= origin_date {
            return Err(ReminderError::RemindDateInPast);
        }

        let conn = self.open()?;
        conn.execute(
            "INSERT INTO reminders (guild_id, author_id, recipient_id, permalink, message, origin_date, remind_date, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new.guild_id as i64,
                new.author_id as i64,
                new.recipient_id as i64,
                new.permalink.as_deref(),
                new.message.as_deref(),
                format_datetime(origin_date),
                format_datetime(new.remind_date),
                ReminderStatus::Waiting.as_str(),
            ],
        )?;

        Ok(ReminderItem {
            idx: conn.last_insert_rowid(),
            guild_id: new.guild_id,
            author_id: new.author_id,
            recipient_id: new.recipient_id,
            permalink: new.permalink,
            message: new.message,
            origin_date,
            remind_date: new.remind_date,
            status: ReminderStatus::Waiting,
        })
    }

    pub fn get(&self, idx: i64) -> Result<Option<ReminderItem>, ReminderError> {
        let items = self.query(&ReminderFilter {
            idx: Some(idx),
            ..ReminderFilter::default()
        })?;
        Ok(items.into_iter().next())
    }

    /// Returns matching reminders ordered by remind date, latest first.
    pub fn query(&self, filter: &ReminderFilter) -> Result<Vec<ReminderItem>, ReminderError> {
        let mut sql = String::from(
            "SELECT id, guild_id, author_id, recipient_id, permalink, message, origin_date, remind_date, status
             FROM reminders",
        );
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(guild_id) = filter.guild_id {
            clauses.push(format!("guild_id = ?{}", values.len() + 1));
            values.push(Box::new(guild_id as i64));
        }
        if let Some(idx) = filter.idx {
            clauses.push(format!("id = ?{}", values.len() + 1));
            values.push(Box::new(idx));
        }
        if let Some(recipient_id) = filter.recipient_id {
            clauses.push(format!("recipient_id = ?{}", values.len() + 1));
            values.push(Box::new(recipient_id as i64));
        }
        if let Some(status) = filter.status {
            clauses.push(format!("status = ?{}", values.len() + 1));
            values.push(Box::new(status.as_str()));
        }
        if let Some(min) = filter.min_origin_date {
            clauses.push(format!("origin_date >= ?{}", values.len() + 1));
            values.push(Box::new(format_datetime(min)));
        }
        if let Some(max) = filter.max_origin_date {
            clauses.push(format!("origin_date <= ?{}", values.len() + 1));
            values.push(Box::new(format_datetime(max)));
        }
        if let Some(min) = filter.min_remind_date {
            clauses.push(format!("remind_date >= ?{}", values.len() + 1));
            values.push(Box::new(format_datetime(min)));
        }
        if let Some(max) = filter.max_remind_date {
            clauses.push(format!("remind_date <= ?{}", values.len() + 1));
            values.push(Box::new(format_datetime(max)));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY remind_date DESC");

        let conn = self.open()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params_from_iter(values.iter().map(|value| value.as_ref())),
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                ))
            },
        )?;

        let mut items = Vec::new();
        for row in rows {
            let (
                idx,
                guild_id,
                author_id,
                recipient_id,
                permalink,
                message,
                origin_raw,
                remind_raw,
                status_raw,
            ) = row?;
            items.push(ReminderItem {
                idx,
                guild_id: guild_id as u64,
                author_id: author_id as u64,
                recipient_id: recipient_id as u64,
                permalink,
                message,
                origin_date: parse_datetime(&origin_raw)?,
                remind_date: parse_datetime(&remind_raw)?,
                status: ReminderStatus::from_str(&status_raw)?,
            });
        }
        Ok(items)
    }

    /// Persists the mutable fields of an existing row.
    pub fn update(&self, item: &ReminderItem) -> Result<(), ReminderError> {
        let conn = self.open()?;
        let changed = conn.execute(
            "UPDATE reminders
             SET status = ?1,
                 remind_date = ?2,
                 message = ?3
             WHERE id = ?4",
            params![
                item.status.as_str(),
                format_datetime(item.remind_date),
                item.message.as_deref(),
                item.idx,
            ],
        )?;
        if changed == 0 {
            return Err(ReminderError::NotFound(item.idx));
        }
        Ok(())
    }

    pub fn delete(&self, idx: i64) -> Result<(), ReminderError> {
        let conn = self.open()?;
        let changed = conn.execute("DELETE FROM reminders WHERE id = ?1", params![idx])?;
        if changed == 0 {
            return Err(ReminderError::NotFound(idx));
        }
        Ok(())
    }

    /// Removes the recipient's resolved reminders in `guild_id` whose remind
    /// date precedes `older_than`. Waiting reminders are never touched.
    pub fn batch_delete(
        &self,
        guild_id: u64,
        recipient_id: u64,
        older_than: DateTime<Utc>,
    ) -> Result<usize, ReminderError> {
        let conn = self.open()?;
        let removed = conn.execute(
            "DELETE FROM reminders
             WHERE guild_id = ?1
               AND recipient_id = ?2
               AND status IN (?3, ?4)
               AND remind_date < ?5",
            params![
                guild_id as i64,
                recipient_id as i64,
                ReminderStatus::Reminded.as_str(),
                ReminderStatus::Failed.as_str(),
                format_datetime(older_than),
            ],
        )?;
        Ok(removed)
    }

    fn open(&self) -> Result<Connection, ReminderError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(REMINDER_SCHEMA)?;
        ensure_reminder_columns(&conn)?;
        Ok(conn)
    }
}
