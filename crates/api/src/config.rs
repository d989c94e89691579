use std::str::FromStr;
use std::time::Duration;

use pitchcraft_db::PoolSettings;

use crate::auth::jwt::JwtConfig;

/// Reasons configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in the environment")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub idle_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            acquire_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Public base URL used to build email verification links.
    pub app_url: String,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `5000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `APP_URL`                 | `http://localhost:5000` |
    /// | `DATABASE_URL`            | **required**            |
    /// | `DB_MAX_CONNECTIONS`      | `20`                    |
    /// | `DB_IDLE_TIMEOUT_SECS`    | `30`                    |
    /// | `DB_CONNECT_TIMEOUT_SECS` | `2`                     |
    ///
    /// JWT variables are documented on [`JwtConfig::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "PORT", 5000)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;
        let app_url = lookup("APP_URL")
            .unwrap_or_else(|| "http://localhost:5000".into())
            .trim_end_matches('/')
            .to_string();

        let database = DatabaseConfig {
            url: required(&lookup, "DATABASE_URL")?,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            idle_timeout_secs: parse_or(&lookup, "DB_IDLE_TIMEOUT_SECS", 30)?,
            connect_timeout_secs: parse_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", 2)?,
        };

        let jwt = JwtConfig::from_vars(&lookup)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            app_url,
            database,
            jwt,
        })
    }
}

/// Read a variable that has no default. Empty values count as missing.
pub(crate) fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<String, ConfigError> {
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(var))
}

/// Parse a variable, falling back to `default` when unset.
pub(crate) fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/pitchcraft"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServerConfig::from_vars(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.app_url, "http://localhost:5000");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.idle_timeout_secs, 30);
        assert_eq!(config.database.connect_timeout_secs, 2);
        assert_eq!(config.jwt.expiry_hours, 24);
        assert_eq!(config.jwt.refresh_window_mins, 60);
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CORS_ORIGINS", "http://a.test, http://b.test,"));
        let config = ServerConfig::from_vars(lookup(&pairs)).unwrap();
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let result = ServerConfig::from_vars(lookup(&[("JWT_SECRET", "secret")]));
        assert_matches!(result, Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let result =
            ServerConfig::from_vars(lookup(&[("DATABASE_URL", "postgres://localhost/db")]));
        assert_matches!(result, Err(ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn invalid_port_is_reported() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "not-a-port"));
        let result = ServerConfig::from_vars(lookup(&pairs));
        assert_matches!(result, Err(ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn pool_settings_use_database_config() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DB_MAX_CONNECTIONS", "5"));
        let config = ServerConfig::from_vars(lookup(&pairs)).unwrap();
        let settings = config.database.pool_settings();
        assert_eq!(settings.max_connections, 5);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(2));
    }
}
