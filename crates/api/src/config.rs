use std::path::PathBuf;
use std::str::FromStr;

use bazaar_core::returns::{DEFAULT_RETURN_WINDOW_DAYS, MAX_RETURN_WINDOW_DAYS};

use crate::auth::jwt::JwtConfig;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// Add `Secure` to auth cookies. Enable behind HTTPS.
    pub cookie_secure: bool,
    /// Directory uploaded images are written to and served from.
    pub upload_dir: PathBuf,
    /// Origin used to build absolute image URLs, without trailing slash.
    pub public_base_url: String,
    /// Per-file upload limit in bytes.
    pub max_upload_bytes: usize,
    /// Days after delivery during which a return may be requested.
    pub return_window_days: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `COOKIE_SECURE`        | `false`                    |
    /// | `UPLOAD_DIR`           | `uploads`                  |
    /// | `PUBLIC_BASE_URL`      | `http://localhost:3000`    |
    /// | `MAX_UPLOAD_BYTES`     | `5242880`                  |
    /// | `RETURN_WINDOW_DAYS`   | `7` (`0..=365`)            |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30)?,
            jwt: JwtConfig::from_env()?,
            cookie_secure: env_or("COOKIE_SECURE", false)?,
            upload_dir: PathBuf::from(
                std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()),
            ),
            public_base_url,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            return_window_days: return_window(env_or(
                "RETURN_WINDOW_DAYS",
                DEFAULT_RETURN_WINDOW_DAYS,
            )?)?,
        })
    }
}

/// Parse `key` from the environment, falling back to `default` when unset.
pub(crate) fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

fn return_window(days: i64) -> Result<i64, ConfigError> {
    if (0..=MAX_RETURN_WINDOW_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ConfigError::Invalid {
            key: "RETURN_WINDOW_DAYS",
            value: days.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn return_window_bounds() {
        assert_eq!(return_window(0).unwrap(), 0);
        assert_eq!(return_window(DEFAULT_RETURN_WINDOW_DAYS).unwrap(), 7);
        assert_eq!(return_window(365).unwrap(), 365);
        assert_matches!(
            return_window(366),
            Err(ConfigError::Invalid { key: "RETURN_WINDOW_DAYS", .. })
        );
        assert_matches!(return_window(-1), Err(ConfigError::Invalid { .. }));
        assert_matches!(return_window(i64::MAX), Err(ConfigError::Invalid { .. }));
    }
}
