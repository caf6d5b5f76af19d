mod countdown;

pub use countdown::{
    CountdownError, CountdownFilter, CountdownItem, NewCountdown, SqliteCountdownStore,
};
