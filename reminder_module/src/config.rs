use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::adapters::discord::DEFAULT_API_BASE;
use crate::reminder::DEFAULT_POLL_INTERVAL;

/// Runtime configuration for the delivery daemon, read from the environment
/// (and a `.env` file when present).
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub reminder_db_path: PathBuf,
    pub poll_interval: Duration,
    pub discord_bot_token: String,
    pub discord_api_base: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DISCORD_BOT_TOKEN not set")]
    MissingBotToken,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let reminder_db_path = env::var("REMINDER_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_state_dir().join("reminders.db"));

        let poll_interval = env::var("REMINDER_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        let discord_bot_token = env::var("DISCORD_BOT_TOKEN")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingBotToken)?;

        let discord_api_base = env::var("DISCORD_API_BASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            reminder_db_path,
            poll_interval,
            discord_bot_token,
            discord_api_base,
        })
    }
}

fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reminderd")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "REMINDER_DB_PATH",
            "REMINDER_POLL_INTERVAL_SECS",
            "DISCORD_BOT_TOKEN",
            "DISCORD_API_BASE_URL",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn from_env_requires_a_bot_token() {
        clear_env();
        assert!(matches!(
            ServiceConfig::from_env(),
            Err(ConfigError::MissingBotToken)
        ));
    }

    #[test]
    #[serial]
    fn from_env_reads_overrides_and_applies_defaults() {
        clear_env();
        env::set_var("DISCORD_BOT_TOKEN", "token-123");
        env::set_var("REMINDER_DB_PATH", "/tmp/test-reminders.db");
        env::set_var("REMINDER_POLL_INTERVAL_SECS", "5");

        let config = ServiceConfig::from_env().expect("config");
        assert_eq!(config.discord_bot_token, "token-123");
        assert_eq!(config.reminder_db_path, PathBuf::from("/tmp/test-reminders.db"));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.discord_api_base, DEFAULT_API_BASE);
        clear_env();
    }
}
