//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `OPTIC_API_BASE_URL` - Backend API base URL (default: `http://127.0.0.1:5000`)
//! - `OPTIC_API_TIMEOUT_SECS` - Per-request timeout in seconds (default: 5)
//! - `OPTIC_SEARCH_DEBOUNCE_MS` - Customer search debounce in milliseconds (default: 300)
//! - `OPTIC_ALLOW_EMPTY_SALE` - Allow submitting a sale with no line items (default: false)
//! - `OPTIC_LOG_JSON` - Emit JSON logs instead of text (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (e.g., "store-1", "staging")

use std::time::Duration;

use optic_desk_core::EmptyCartPolicy;
use thiserror::Error;
use url::Url;

/// Default backend location when none is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: &str = "5";
const DEFAULT_DEBOUNCE_MS: &str = "300";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where and how to reach the backend API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Upper bound on a single request, connect included
    pub timeout: Duration,
}

impl ApiConfig {
    /// Build an API configuration with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url, "OPTIC_API_BASE_URL")?,
            timeout: Duration::from_secs(5),
        })
    }

    /// Override the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend API settings
    pub api: ApiConfig,
    /// Quiet period after the last keystroke before a customer search fires
    pub search_debounce: Duration,
    /// Whether an empty sale may be submitted
    pub empty_cart_policy: EmptyCartPolicy,
    /// Emit JSON logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "store-1", "staging")
    pub sentry_environment: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_source<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(
            &get_env_or_default(&env, "OPTIC_API_BASE_URL", DEFAULT_API_BASE_URL),
            "OPTIC_API_BASE_URL",
        )?;

        let timeout_secs = parse_number(&env, "OPTIC_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "OPTIC_API_TIMEOUT_SECS".to_string(),
                "must be at least 1 second".to_string(),
            ));
        }
        let debounce_ms = parse_number(&env, "OPTIC_SEARCH_DEBOUNCE_MS", DEFAULT_DEBOUNCE_MS)?;

        let empty_cart_policy = if parse_flag(&env, "OPTIC_ALLOW_EMPTY_SALE")? {
            EmptyCartPolicy::AllowZeroAmount
        } else {
            EmptyCartPolicy::Reject
        };

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            search_debounce: Duration::from_millis(debounce_ms),
            empty_cart_policy,
            log_json: parse_flag(&env, "OPTIC_LOG_JSON")?,
            sentry_dsn: get_optional_env(&env, "SENTRY_DSN"),
            sentry_environment: get_optional_env(&env, "SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank as unset.
fn get_optional_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    get_optional_env(env, key).unwrap_or_else(|| default.to_string())
}

fn parse_number(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<u64, ConfigError> {
    get_env_or_default(env, key, default)
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_flag(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<bool, ConfigError> {
    let Some(raw) = get_optional_env(env, key) else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

fn parse_base_url(raw: &str, key: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("'{raw}' is not an http(s) base URL"),
        ));
    }
    Ok(url)
}
