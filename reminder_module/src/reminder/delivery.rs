use tracing::{debug, warn};

use crate::channel::{DeliveryPayload, DirectMessenger, RecipientDirectory};

use super::store::SqliteReminderStore;
use super::types::{ReminderError, ReminderItem, ReminderStatus};
use super::utils::escape_markdown;

/// Attempts delivery of due reminders and records the outcome.
///
/// Every failure mode on the way to the recipient is terminal for the item:
/// it is marked `FAILED`, logged, and never retried. Only storage errors
/// while persisting the outcome propagate to the caller.
pub struct ReminderDeliverer<D, M> {
    store: SqliteReminderStore,
    directory: D,
    messenger: M,
}

impl<D: RecipientDirectory, M: DirectMessenger> ReminderDeliverer<D, M> {
    pub fn new(store: SqliteReminderStore, directory: D, messenger: M) -> Self {
        Self {
            store,
            directory,
            messenger,
        }
    }

    /// Makes exactly one delivery attempt for `item` and persists the
    /// resulting status transition.
    pub fn attempt(&self, item: &ReminderItem) -> Result<(), ReminderError> {
        // The row may have been edited or deleted since the sweep selected it.
        let mut item = match self.store.get(item.idx)? {
            Some(fresh) if fresh.status == ReminderStatus::Waiting => fresh,
            Some(_) | None => {
                debug!(idx = item.idx, "skipping reminder that is no longer waiting");
                return Ok(());
            }
        };

        let recipient = match self.directory.resolve(item.recipient_id, item.guild_id) {
            Ok(Some(recipient)) => recipient,
            Ok(None) => {
                item.status = ReminderStatus::Failed;
                self.store.update(&item)?;
                warn!(
                    recipient_id = item.recipient_id,
                    guild_id = item.guild_id,
                    "unable to remind user - member out of reach"
                );
                return Ok(());
            }
            Err(err) => {
                item.status = ReminderStatus::Failed;
                self.store.update(&item)?;
                warn!(
                    recipient_id = item.recipient_id,
                    guild_id = item.guild_id,
                    error = %err,
                    "unable to remind user - recipient lookup failed"
                );
                return Ok(());
            }
        };

        let payload = self.build_payload(&item);
        if let Err(err) = self.messenger.send_direct(&recipient, &payload) {
            item.status = ReminderStatus::Failed;
            self.store.update(&item)?;
            warn!(
                recipient_id = item.recipient_id,
                guild_id = item.guild_id,
                error = %err,
                "unable to remind user - blocked DM or not enough permissions"
            );
            return Ok(());
        }

        item.status = ReminderStatus::Reminded;
        self.store.update(&item)?;
        debug!(
            idx = item.idx,
            recipient = %recipient.display_name,
            "reminder sent"
        );
        Ok(())
    }

    fn build_payload(&self, item: &ReminderItem) -> DeliveryPayload {
        let reminded_by = if item.author_id != item.recipient_id {
            let author = self
                .directory
                .resolve(item.author_id, item.guild_id)
                .ok()
                .flatten();
            Some(match author {
                Some(author) => escape_markdown(&author.display_name),
                None => "(unknown)".to_string(),
            })
        } else {
            None
        };

        DeliveryPayload {
            reminded_by,
            message: item.message.clone().filter(|text| !text.is_empty()),
            permalink: item.permalink.clone().filter(|link| !link.is_empty()),
            remind_date: item.remind_date,
        }
    }
}
