//! Credentials and settings management.
//!
//! Credentials are read once at startup from `MYSHOWS_LOGIN` and
//! `MYSHOWS_PASSWORD`; a missing or empty value is a fatal configuration error.
//! Everything else (endpoints, timeouts, retry) has defaults that can be
//! overridden through `MYSHOWS_`-prefixed environment variables.

use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable holding the myshows.me login.
pub const LOGIN_ENV: &str = "MYSHOWS_LOGIN";

/// Environment variable holding the myshows.me password.
pub const PASSWORD_ENV: &str = "MYSHOWS_PASSWORD";

/// Errors raised while loading configuration at startup
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing or empty
    #[error("required environment variable {0} is missing or empty")]
    MissingCredential(&'static str),

    /// A configured endpoint is not a valid URL
    #[error("invalid URL in {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    /// Underlying settings-source error
    #[error("failed to load settings: {0}")]
    Source(#[from] config::ConfigError),
}

/// The (login, password) pair used for the single startup login call.
///
/// Immutable for the process lifetime and never logged or written to disk.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    /// Read credentials from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let login = required_env(LOGIN_ENV)?;
        let password = required_env(PASSWORD_ENV)?;
        Ok(Self { login, password })
    }

    /// Build credentials directly, for tests and embedding.
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of debug output and logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingCredential(name)),
    }
}

/// Application settings (endpoints, timeouts, retry)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// JSON-RPC endpoint for all API calls
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Session endpoint used for the startup login call
    #[serde(default = "default_session_url")]
    pub session_url: String,

    /// HTTP timeouts
    #[serde(default)]
    pub http: HttpSettings,

    /// Retry policy for transient remote failures
    #[serde(default)]
    pub retry: RetrySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            session_url: default_session_url(),
            http: HttpSettings::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl Settings {
    /// Validate that the configured endpoints are well-formed URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidUrl {
            field: "api_url",
            reason: e.to_string(),
        })?;
        Url::parse(&self.session_url).map_err(|e| ConfigError::InvalidUrl {
            field: "session_url",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// HTTP client timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Retry policy. At most one retry by default; only transient failures
/// (timeouts, connection errors, 429/5xx) are retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
        }
    }
}

fn default_api_url() -> String {
    "https://myshows.me/v3/rpc/".to_string()
}

fn default_session_url() -> String {
    "https://myshows.me/api/session".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    2
}

fn default_initial_delay_ms() -> u64 {
    500
}

/// Load settings from the environment (`MYSHOWS_` prefix), falling back to
/// defaults for anything unset.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let sources = config::Config::builder()
        .add_source(
            config::Environment::with_prefix("MYSHOWS")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings: Settings = sources.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.api_url, "https://myshows.me/v3/rpc/");
        assert_eq!(settings.session_url, "https://myshows.me/api/session");
        assert_eq!(settings.http.request_timeout_secs, 30);
        assert_eq!(settings.retry.max_attempts, 2);
        settings.validate().unwrap();
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let settings = Settings {
            api_url: "not a url".to_string(),
            ..Settings::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidUrl { field: "api_url", .. }
        ));
    }

    #[test]
    fn test_env_overrides_endpoints() {
        std::env::set_var("MYSHOWS_API_URL", "http://127.0.0.1:9999/v3/rpc/");

        let settings = load_settings().unwrap();
        assert_eq!(settings.api_url, "http://127.0.0.1:9999/v3/rpc/");
        // Unset values keep their defaults.
        assert_eq!(settings.session_url, "https://myshows.me/api/session");

        std::env::remove_var("MYSHOWS_API_URL");
    }

    #[test]
    fn test_missing_credentials_fail_fast() {
        std::env::remove_var(LOGIN_ENV);
        std::env::remove_var(PASSWORD_ENV);
        let err = Credentials::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn test_empty_credential_rejected() {
        std::env::set_var("MYSHOWS_TEST_EMPTY", "   ");
        assert!(required_env("MYSHOWS_TEST_EMPTY").is_err());
        std::env::remove_var("MYSHOWS_TEST_EMPTY");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("someone", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("someone"));
        assert!(!printed.contains("hunter2"));
    }
}
