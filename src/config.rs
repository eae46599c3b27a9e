//! Tracker configuration.

use super::error::ConfigError;
use std::path::PathBuf;

/// Configuration for the request store and dashboard listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Directory of the sled store (default: `request-tracker.db`).
    pub db_path: PathBuf,
    /// Rows in the admin queue (default: 50).
    pub queue_limit: usize,
    /// Rows in a requester's recent list (default: 25).
    pub recent_limit: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("request-tracker.db"),
            queue_limit: 50,
            recent_limit: 25,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `TRACKER_DB_PATH`, `TRACKER_QUEUE_LIMIT` and
    /// `TRACKER_RECENT_LIMIT` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("TRACKER_DB_PATH").filter(|p| !p.trim().is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(value) = lookup("TRACKER_QUEUE_LIMIT") {
            config.queue_limit = parse_limit("TRACKER_QUEUE_LIMIT", value)?;
        }
        if let Some(value) = lookup("TRACKER_RECENT_LIMIT") {
            config.recent_limit = parse_limit("TRACKER_RECENT_LIMIT", value)?;
        }
        Ok(config)
    }
}

fn parse_limit(key: &'static str, value: String) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber { key, value }),
    }
}
