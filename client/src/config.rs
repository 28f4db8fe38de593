//! Configuration management for the sync client.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote bookmark API
    pub api_url: String,
    /// Bearer token issued by the auth service, if any
    pub api_token: Option<String>,
    /// Directory holding the local store
    pub data_dir: PathBuf,
    /// Period of the background sync trigger
    pub sync_interval: Duration,
    /// Upper bound on every remote call
    pub request_timeout: Duration,
    /// Period of the connectivity probe
    pub health_interval: Duration,
    /// Upper bound on a single connectivity probe
    pub probe_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("MARKS_API_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingApiUrl)?
            .trim_end_matches('/')
            .to_string();

        let api_token = lookup("MARKS_API_TOKEN").filter(|t| !t.is_empty());

        let data_dir = lookup("MARKS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".marks"));

        Ok(Self {
            api_url,
            api_token,
            data_dir,
            sync_interval: seconds(&lookup, "MARKS_SYNC_INTERVAL_SECS", 60)?,
            request_timeout: seconds(&lookup, "MARKS_REQUEST_TIMEOUT_SECS", 10)?,
            health_interval: seconds(&lookup, "MARKS_HEALTH_INTERVAL_SECS", 15)?,
            probe_timeout: seconds(&lookup, "MARKS_PROBE_TIMEOUT_SECS", 8)?,
        })
    }
}

fn seconds<F>(lookup: &F, var: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidNumber { var }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("MARKS_API_URL environment variable is required")]
    MissingApiUrl,

    #[error("invalid value for {var}: expected a positive number of seconds")]
    InvalidNumber { var: &'static str },
}
