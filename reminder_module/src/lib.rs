pub mod adapters;
pub mod channel;
pub mod config;

mod reminder;

pub use reminder::{
    shorten_message, NewReminder, PollerControl, ReminderDeliverer, ReminderError, ReminderFilter,
    ReminderItem, ReminderPoller, ReminderService, ReminderStatus, SqliteReminderStore,
    DEFAULT_POLL_INTERVAL, MESSAGE_MAX_CHARS,
};
