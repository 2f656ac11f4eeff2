//! API server configuration

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Server configuration loaded from the environment
#[derive(Clone)]
pub struct Config {
    pub bind_address: String,
    pub database_url: String,
    /// HS256 key for session tokens
    pub session_secret: String,
    pub session_cookie_name: String,
    pub session_ttl_hours: i64,
    /// Fallback origin for checkout redirects when the request has no Origin header
    pub app_url: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let session_ttl_hours = match std::env::var("SESSION_TTL_HOURS") {
            Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "SESSION_TTL_HOURS",
                reason: format!("'{}' is not a number of hours", value),
            })?,
            Err(_) => 24,
        };

        Ok(Self {
            bind_address: std::env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            database_url: required("DATABASE_URL")?,
            session_secret: required("SESSION_SECRET")?,
            session_cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "greenzone_session".to_string()),
            session_ttl_hours,
            app_url: std::env::var("APP_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            allowed_origins: parse_origins(
                &std::env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
            ),
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            bind_address: "127.0.0.1:0".to_string(),
            database_url: "postgresql://localhost/greenzone_test".to_string(),
            session_secret: "test-session-secret-for-testing-only".to_string(),
            session_cookie_name: "greenzone_session".to_string(),
            session_ttl_hours: 24,
            app_url: "http://localhost:3000".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("database_url", &"[redacted]")
            .field("session_secret", &"[redacted]")
            .field("session_cookie_name", &self.session_cookie_name)
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("app_url", &self.app_url)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

/// `LOG_FORMAT=json` switches the subscriber to JSON lines. Read before the rest of
/// the configuration so startup errors are logged in the right format.
pub fn log_format_is_json() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://a.app ,,https://b.app"),
            vec!["https://a.app".to_string(), "https://b.app".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", Config::for_tests());
        assert!(!debug.contains("test-session-secret"));
        assert!(!debug.contains("greenzone_test"));
    }
}
