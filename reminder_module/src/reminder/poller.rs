use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, warn};

use crate::channel::{DirectMessenger, RecipientDirectory};

use super::delivery::ReminderDeliverer;
use super::store::{ReminderFilter, SqliteReminderStore};
use super::types::{ReminderError, ReminderStatus};

/// Default sweep interval. Every waiting reminder is delivered at most one
/// interval after its remind date.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

const WAIT_SLICE: Duration = Duration::from_millis(250);

/// Fixed-interval sweep over waiting reminders.
///
/// Each tick selects everything that falls due before the next tick would
/// run and hands the items to the deliverer one at a time. Items are
/// re-fetched every tick; nothing holds a row across ticks.
pub struct ReminderPoller<D, M> {
    store: SqliteReminderStore,
    deliverer: ReminderDeliverer<D, M>,
    interval: Duration,
}

impl<D: RecipientDirectory, M: DirectMessenger> ReminderPoller<D, M> {
    pub fn new(
        store: SqliteReminderStore,
        deliverer: ReminderDeliverer<D, M>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            deliverer,
            interval,
        }
    }

    /// Runs one sweep at `now`: every waiting reminder with a remind date up
    /// to `now + interval` gets exactly one delivery attempt. A failing item
    /// is logged and does not keep the rest of the sweep from running.
    pub fn tick(&self, now: DateTime<Utc>) -> Result<(), ReminderError> {
        let lookahead =
            ChronoDuration::from_std(self.interval).map_err(|_| ReminderError::DurationOutOfRange)?;
        let due = self.store.query(&ReminderFilter {
            status: Some(ReminderStatus::Waiting),
            max_remind_date: Some(now + lookahead),
            ..ReminderFilter::default()
        })?;

        for item in &due {
            if let Err(err) = self.deliverer.attempt(item) {
                error!(idx = item.idx, error = %err, "reminder delivery attempt errored");
            }
        }
        Ok(())
    }

    /// Ticks until `stop` is raised. No tick runs before `ready` is raised,
    /// and none starts after `stop`; an in-flight tick always completes.
    pub fn run_loop(&self, ready: &AtomicBool, stop: &AtomicBool) {
        while !ready.load(Ordering::Relaxed) {
            if stop.load(Ordering::Relaxed) {
                return;
            }
            thread::sleep(WAIT_SLICE);
        }

        while !stop.load(Ordering::Relaxed) {
            if let Err(err) = self.tick(Utc::now()) {
                warn!(error = %err, "reminder sweep failed");
            }
            sleep_unless_stopped(self.interval, stop);
        }
    }
}

fn sleep_unless_stopped(total: Duration, stop: &AtomicBool) {
    let mut remaining = total;
    while !remaining.is_zero() && !stop.load(Ordering::Relaxed) {
        let slice = remaining.min(WAIT_SLICE);
        thread::sleep(slice);
        remaining -= slice;
    }
}

/// Handle over the background polling thread.
pub struct PollerControl {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PollerControl {
    /// Spawns the poll loop. Ticking starts once `ready` is raised by the
    /// host, typically after the store and channel are known to be usable.
    pub fn start<D, M>(poller: ReminderPoller<D, M>, ready: Arc<AtomicBool>) -> Self
    where
        D: RecipientDirectory + Send + 'static,
        M: DirectMessenger + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let handle = thread::spawn(move || {
            poller.run_loop(&ready, &thread_stop);
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn stop_and_join(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
