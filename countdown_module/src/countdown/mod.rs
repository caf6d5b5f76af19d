mod store;
mod types;
mod utils;

pub use store::{CountdownFilter, SqliteCountdownStore};
pub use types::{CountdownError, CountdownItem, NewCountdown};
