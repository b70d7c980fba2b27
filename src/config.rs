//! Console configuration, read from the environment (and `.env` via dotenvy).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConsoleError, ConsoleResult};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5115/api";
pub const DEFAULT_STATE_DIR: &str = ".itam_console";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the REST backend, without a trailing slash.
    pub api_base_url: String,
    /// Directory holding the durable session slots.
    pub state_dir: PathBuf,
    pub http_timeout: Duration,
    /// When set, logs are also written to a daily-rolling file here.
    pub log_dir: Option<PathBuf>,
}

impl ConsoleConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn load() -> ConsoleResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConsoleResult<Self> {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let api_base_url = normalize_base_url(
            non_empty("ITAM_API_BASE_URL")
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        );
        let state_dir = non_empty("ITAM_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
        let http_timeout_secs = match non_empty("ITAM_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                ConsoleError::Config(format!(
                    "ITAM_HTTP_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                ))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };
        if http_timeout_secs == 0 {
            return Err(ConsoleError::Config(
                "ITAM_HTTP_TIMEOUT_SECS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            api_base_url,
            state_dir,
            http_timeout: Duration::from_secs(http_timeout_secs),
            log_dir: non_empty("ITAM_LOG_DIR").map(PathBuf::from),
        })
    }

    pub fn with_api_base_url(mut self, api_base_url: &str) -> Self {
        self.api_base_url = normalize_base_url(api_base_url);
        self
    }

    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}
