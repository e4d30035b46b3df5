//! Database configuration module.
//!
//! Provides configuration structures for database connection management.

use std::env;

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string (default: development URL)
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Create configuration from any variable source
    ///
    /// # Arguments
    ///
    /// * `env` - Lookup returning the value of a variable, if set
    ///
    /// # Returns
    ///
    /// * `DatabaseConfig` - Configuration with unset or unparseable values defaulted
    pub fn from_env_with<F>(env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::development();
        Self {
            database_url: env("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_env_or(&env, "DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: parse_env_or(&env, "DB_MIN_CONNECTIONS", defaults.min_connections),
            connection_timeout_secs: parse_env_or(
                &env,
                "DB_CONNECTION_TIMEOUT",
                defaults.connection_timeout_secs,
            ),
            idle_timeout_secs: parse_env_or(&env, "DB_IDLE_TIMEOUT", defaults.idle_timeout_secs),
            max_lifetime_secs: parse_env_or(&env, "DB_MAX_LIFETIME", defaults.max_lifetime_secs),
        }
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/padel` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/padel".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }

    /// Same configuration pointed at another database
    pub fn with_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = database_url.into();
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn parse_env_or<T, F>(env: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    env(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config, DatabaseConfig::development());
        assert!(config.max_connections >= config.min_connections);
    }

    #[test]
    fn test_with_url() {
        let config = DatabaseConfig::development().with_url("postgres://db/other");
        assert_eq!(config.database_url, "postgres://db/other");
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_from_env_with_injected_values() {
        let config = DatabaseConfig::from_env_with(|key| match key {
            "DATABASE_URL" => Some("postgres://db/injected".to_string()),
            "DB_MAX_CONNECTIONS" => Some("25".to_string()),
            "DB_IDLE_TIMEOUT" => Some("soon".to_string()),
            _ => None,
        });

        assert_eq!(config.database_url, "postgres://db/injected");
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.idle_timeout_secs, 600);
        assert_eq!(config.min_connections, 1);
    }
}
