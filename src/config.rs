use chrono::{Duration, FixedOffset};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    /// Location reference of the registry sheet (URL of its CSV export)
    pub registry_location: String,
    pub poll_interval_secs: u64,
    /// Offset of the configured deadline timezone, in minutes east of UTC
    pub tz_offset_minutes: i32,
    /// Label that marks a time as belonging to the configured timezone,
    /// e.g. "МСК" in "21:00 по МСК"
    pub tz_label: String,
    /// Payment status value that marks a ledger row as settled
    pub paid_sentinel: String,
    pub reminder_window_hours: i64,
    pub fetch_concurrency: usize,
    pub fetch_timeout_secs: u64,
    pub telegram_bot_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://boxtally.db?mode=rwc".to_string()),
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            registry_location: std::env::var("REGISTRY_LOCATION").map_err(|_| {
                config::ConfigError::NotFound("REGISTRY_LOCATION".to_string())
            })?,
            poll_interval_secs: env_parsed("POLL_INTERVAL_SECS", 60),
            tz_offset_minutes: env_parsed("TZ_OFFSET_MINUTES", 180),
            tz_label: std::env::var("TZ_LABEL").unwrap_or_else(|_| "МСК".to_string()),
            paid_sentinel: std::env::var("PAID_SENTINEL")
                .unwrap_or_else(|_| "paid".to_string()),
            reminder_window_hours: env_parsed("REMINDER_WINDOW_HOURS", 24),
            fetch_concurrency: env_parsed("FETCH_CONCURRENCY", 4),
            fetch_timeout_secs: env_parsed("FETCH_TIMEOUT_SECS", 10),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").ok(),
        })
    }

    /// Deadline timezone as a fixed offset; falls back to UTC when the
    /// configured offset is out of range.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.tz_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("UTC offset is valid"))
    }

    pub fn reminder_window(&self) -> Duration {
        Duration::hours(self.reminder_window_hours)
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
