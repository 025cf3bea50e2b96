// src/utils/config.rs
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::error::EdgarError;

pub const ENV_USER_AGENT: &str = "SEC_USER_AGENT";
pub const ENV_TIMEOUT_SECS: &str = "EDGAR_TIMEOUT_SECS";
pub const ENV_REQUEST_DELAY_MS: &str = "EDGAR_REQUEST_DELAY_MS";
pub const ENV_CACHE_DIR: &str = "EDGAR_CACHE_DIR";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
// SEC asks for 10 requests/second max. Be conservative. >100ms delay.
const DEFAULT_REQUEST_DELAY_MS: u64 = 150;

/// Settings shared by every EDGAR request.
#[derive(Debug, Clone)]
pub struct EdgarConfig {
    /// Contact string sent as the `User-Agent` header. Required by SEC.
    pub user_agent: Option<String>,
    pub timeout: Duration,
    pub request_delay: Duration,
    /// Where the ticker table is cached between runs. `None` disables it.
    pub cache_dir: Option<PathBuf>,
    /// Ignore the cached ticker table and fetch a fresh one.
    pub refresh_tickers: bool,
    /// Also fetch the archived submission pages, not just `recent`.
    pub include_archived: bool,
}

impl Default for EdgarConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            cache_dir: None,
            refresh_tickers: false,
            include_archived: false,
        }
    }
}

impl EdgarConfig {
    /// Builds a config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(agent) = std::env::var(ENV_USER_AGENT) {
            config.user_agent = Some(agent);
        }
        if let Some(secs) = env_u64(ENV_TIMEOUT_SECS) {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = env_u64(ENV_REQUEST_DELAY_MS) {
            config.request_delay = Duration::from_millis(ms);
        }
        if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
            config.cache_dir = Some(PathBuf::from(dir));
        }

        tracing::debug!("Loaded EDGAR config from environment: {:?}", config);
        config
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Returns the trimmed contact string, or `MissingPrecondition` when it is
    /// unset or blank.
    pub fn require_user_agent(&self) -> Result<&str, EdgarError> {
        require_contact(self.user_agent.as_deref().unwrap_or_default())
    }
}

/// Checks that a contact string is usable as the SEC `User-Agent`.
pub fn require_contact(user_agent: &str) -> Result<&str, EdgarError> {
    let trimmed = user_agent.trim();
    if trimmed.is_empty() {
        return Err(EdgarError::MissingPrecondition(format!(
            "no User-Agent contact configured (set {} or pass --user-agent)",
            ENV_USER_AGENT
        )));
    }
    Ok(trimmed)
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a whole number", key, raw);
            None
        }
    }
}
