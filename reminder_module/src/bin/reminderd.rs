use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use reminder_module::adapters::discord::DiscordRestClient;
use reminder_module::config::ServiceConfig;
use reminder_module::{PollerControl, ReminderDeliverer, ReminderPoller, SqliteReminderStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = ServiceConfig::from_env()?;

    let store = SqliteReminderStore::new(&config.reminder_db_path)?;
    let client = DiscordRestClient::with_api_base(&config.discord_bot_token, &config.discord_api_base);
    let deliverer = ReminderDeliverer::new(store.clone(), client.clone(), client);
    let poller = ReminderPoller::new(store, deliverer, config.poll_interval);

    let ready = Arc::new(AtomicBool::new(false));
    let mut control = PollerControl::start(poller, ready.clone());

    // Everything the sweep needs is in place; let it start ticking.
    ready.store(true, Ordering::Relaxed);
    info!(
        "reminder delivery running (interval {}s, db {})",
        config.poll_interval.as_secs(),
        config.reminder_db_path.display()
    );

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("unable to wait for shutdown signal: {}", err);
    }
    info!("shutting down");
    control.stop_and_join();
    Ok(())
}
