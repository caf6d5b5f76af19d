//! Channel-facing seam between the reminder core and the messaging platform.
//!
//! The delivery path only sees these traits; the concrete REST adapter lives
//! in [`crate::adapters`] and fakes slot in for tests.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// A live, reachable recipient handle on the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub id: u64,
    pub display_name: String,
}

/// Content of a single reminder direct message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryPayload {
    /// Author display name, present only when someone else set the reminder.
    pub reminded_by: Option<String>,
    pub message: Option<String>,
    pub permalink: Option<String>,
    pub remind_date: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected api response {status}: {body}")]
    Api { status: u16, body: String },
}

/// Why the channel did not accept a direct message.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The channel refused the message (blocked DMs, missing permission).
    #[error("delivery refused: {0}")]
    Refused(String),
    #[error(transparent)]
    Transport(#[from] AdapterError),
}

/// Looks up recipient handles on the messaging channel.
pub trait RecipientDirectory {
    /// Resolves `user_id` within `guild_id` (0 = no guild), falling back to
    /// a global lookup. `Ok(None)` means the user is out of reach.
    fn resolve(&self, user_id: u64, guild_id: u64) -> Result<Option<Recipient>, AdapterError>;
}

/// Sends one direct message to a resolved recipient.
pub trait DirectMessenger {
    fn send_direct(
        &self,
        recipient: &Recipient,
        payload: &DeliveryPayload,
    ) -> Result<(), DeliveryError>;
}
