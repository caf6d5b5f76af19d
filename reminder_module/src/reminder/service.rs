use chrono::{DateTime, Utc};
use tracing::debug;

use super::store::{ReminderFilter, SqliteReminderStore};
use super::types::{NewReminder, ReminderError, ReminderItem, ReminderStatus, MESSAGE_MAX_CHARS};
use super::utils::shorten_message;

/// The operations the command layer drives: create, inspect, reschedule,
/// delete and purge reminders. Authorization lives here; interactive
/// confirmation stays with the caller.
#[derive(Debug, Clone)]
pub struct ReminderService {
    store: SqliteReminderStore,
}

impl ReminderService {
    pub fn new(store: SqliteReminderStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SqliteReminderStore {
        &self.store
    }

    pub fn create(
        &self,
        guild_id: u64,
        author_id: u64,
        recipient_id: u64,
        message: Option<&str>,
        remind_date: DateTime<Utc>,
        permalink: Option<&str>,
    ) -> Result<ReminderItem, ReminderError> {
        let message = message.map(|text| shorten_message(text, MESSAGE_MAX_CHARS));
        let item = self.store.insert(NewReminder {
            guild_id,
            author_id,
            recipient_id,
            message,
            remind_date,
            permalink: permalink.map(str::to_string),
        })?;
        debug!(
            idx = item.idx,
            recipient_id,
            remind_date = %item.remind_date,
            "reminder created"
        );
        Ok(item)
    }

    pub fn list(&self, filter: &ReminderFilter) -> Result<Vec<ReminderItem>, ReminderError> {
        self.store.query(filter)
    }

    /// Fetches one reminder; only its author or recipient may see it.
    pub fn get(&self, caller_id: u64, idx: i64) -> Result<ReminderItem, ReminderError> {
        let item = self.store.get(idx)?.ok_or(ReminderError::NotFound(idx))?;
        if caller_id != item.author_id && caller_id != item.recipient_id {
            return Err(ReminderError::PermissionDenied);
        }
        Ok(item)
    }

    /// Moves a reminder to a new date and re-admits it to polling, whatever
    /// state it was in. Only the recipient may reschedule.
    pub fn reschedule(
        &self,
        caller_id: u64,
        idx: i64,
        remind_date: DateTime<Utc>,
        message: Option<&str>,
    ) -> Result<ReminderItem, ReminderError> {
        let mut item = self.store.get(idx)?.ok_or(ReminderError::NotFound(idx))?;
        if caller_id != item.recipient_id {
            return Err(ReminderError::PermissionDenied);
        }
        if remind_date <= Utc::now() {
            return Err(ReminderError::RemindDateInPast);
        }

        item.remind_date = remind_date;
        if let Some(text) = message {
            item.message = Some(shorten_message(text, MESSAGE_MAX_CHARS));
        }
        item.status = ReminderStatus::Waiting;
        self.store.update(&item)?;
        debug!(idx, remind_date = %item.remind_date, "reminder rescheduled");
        Ok(item)
    }

    /// Removes a reminder. Only the recipient may delete.
    pub fn delete(&self, caller_id: u64, idx: i64) -> Result<(), ReminderError> {
        let item = self.store.get(idx)?.ok_or(ReminderError::NotFound(idx))?;
        if caller_id != item.recipient_id {
            return Err(ReminderError::PermissionDenied);
        }
        self.store.delete(item.idx)?;
        debug!(idx, "reminder deleted");
        Ok(())
    }

    /// Removes the caller's resolved reminders older than `older_than` and
    /// reports how many went away.
    pub fn purge_old(
        &self,
        guild_id: u64,
        caller_id: u64,
        older_than: DateTime<Utc>,
    ) -> Result<usize, ReminderError> {
        let removed = self.store.batch_delete(guild_id, caller_id, older_than)?;
        if removed > 0 {
            debug!(guild_id, caller_id, removed, "old reminders purged");
        }
        Ok(removed)
    }
}
