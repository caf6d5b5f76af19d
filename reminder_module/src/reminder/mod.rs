mod delivery;
mod poller;
mod service;
mod store;
mod types;
mod utils;

pub use delivery::ReminderDeliverer;
pub use poller::{PollerControl, ReminderPoller, DEFAULT_POLL_INTERVAL};
pub use service::ReminderService;
pub use store::{ReminderFilter, SqliteReminderStore};
pub use types::{NewReminder, ReminderError, ReminderItem, ReminderStatus, MESSAGE_MAX_CHARS};
pub use utils::shorten_message;
