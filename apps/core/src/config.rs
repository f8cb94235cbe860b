//! Runtime configuration.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by the binary). Every setting has a default, so an empty environment is
//! a valid configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{AppError, AppResult};

// --- Constants ---
pub const DEFAULT_API_URL: &str = "https://world.openfoodfacts.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_CACHE_PATH: &str = "foods.csv";
pub const DEFAULT_USER_AGENT: &str = concat!("wisewhisk/", env!("CARGO_PKG_VERSION"));

const ENV_API_URL: &str = "WISEWHISK_API_URL";
const ENV_TIMEOUT_SECS: &str = "WISEWHISK_TIMEOUT_SECS";
const ENV_CACHE_PATH: &str = "WISEWHISK_CACHE_PATH";
const ENV_LOG_FORMAT: &str = "WISEWHISK_LOG_FORMAT";
const ENV_USER_AGENT: &str = "WISEWHISK_USER_AGENT";

/// Application configuration shared by the lookup clients and the CLI.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the Open Food Facts compatible product database.
    pub api_base_url: String,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
    /// Path of the optional local CSV catalog.
    pub cache_path: PathBuf,
    /// Emit logs as JSON lines instead of human-readable text.
    pub log_json: bool,
    /// User-Agent header sent to the product database.
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            log_json: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AppConfig {
    /// Builds the configuration from environment variables, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the API URL does not parse or the timeout
    /// is not a positive integer.
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(url) = env::var(ENV_API_URL) {
            config.api_base_url = url;
        }

        if let Ok(raw) = env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AppError::Config(format!("{} must be a whole number of seconds, got '{}'", ENV_TIMEOUT_SECS, raw))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(path) = env::var(ENV_CACHE_PATH) {
            config.cache_path = PathBuf::from(path);
        }

        if let Ok(format) = env::var(ENV_LOG_FORMAT) {
            config.log_json = format.eq_ignore_ascii_case("json");
        }

        if let Ok(agent) = env::var(ENV_USER_AGENT) {
            if !agent.trim().is_empty() {
                config.user_agent = agent;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the lookup client relies on.
    pub fn validate(&self) -> AppResult<()> {
        let url = Url::parse(&self.api_base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "{} must use http or https, got '{}'",
                ENV_API_URL,
                url.scheme()
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(AppError::Config(format!("{} must be greater than zero", ENV_TIMEOUT_SECS)));
        }
        Ok(())
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}
