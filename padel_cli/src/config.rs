//! Simulation configuration management.
//!
//! Command line flags take precedence over environment variables, which take
//! precedence over built-in defaults.

use padel::db::DatabaseConfig;
use padel::tournament::{FinalMatchPattern, TournamentFormat};

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub players: Option<usize>,
    pub courts: Option<u32>,
    pub rounds: Option<u32>,
    pub points_per_match: Option<u32>,
    pub format: Option<String>,
    pub final_match: Option<u8>,
    pub seed: Option<u64>,
    pub database_url: Option<String>,
    pub play_final: bool,
    pub postgres: bool,
    pub json: bool,
}

/// Complete simulation configuration
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Number of registered players
    pub players: usize,
    /// Number of courts
    pub courts: u32,
    /// Regular rounds to play before the optional final
    pub rounds: u32,
    pub points_per_match: u32,
    pub format: TournamentFormat,
    pub final_match: FinalMatchPattern,
    /// Whether a final round is drawn after the regular rounds
    pub play_final: bool,
    /// Seed for pairing and scores; entropy when unset
    pub seed: Option<u64>,
    /// PostgreSQL storage; in-memory when unset
    pub database: Option<DatabaseConfig>,
    /// Print the report as JSON
    pub json: bool,
}

impl CliConfig {
    /// Load configuration from environment variables with command line overrides
    ///
    /// # Errors
    ///
    /// Returns error if a format or final match code cannot be parsed
    pub fn from_env(overrides: CliOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    fn resolve<F>(overrides: CliOverrides, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let format_text = overrides
            .format
            .or_else(|| env("PADEL_FORMAT"))
            .unwrap_or_else(|| TournamentFormat::Americano.to_string());
        let format = format_text
            .parse::<TournamentFormat>()
            .map_err(|_| ConfigError::Invalid {
                var: "PADEL_FORMAT".to_string(),
                reason: format!("Unknown format '{format_text}', expected AMERICANO or MEXICANO"),
            })?;

        let final_code = overrides
            .final_match
            .unwrap_or_else(|| parse_env_or(&env, "PADEL_FINAL_MATCH", 2));
        let final_match =
            FinalMatchPattern::from_code(final_code).ok_or_else(|| ConfigError::Invalid {
                var: "PADEL_FINAL_MATCH".to_string(),
                reason: format!("Unknown final match code {final_code}, expected 1, 2 or 3"),
            })?;

        let database_url = overrides.database_url.or_else(|| env("DATABASE_URL"));
        let database = if overrides.postgres || parse_env_or(&env, "PADEL_POSTGRES", false) {
            let config = DatabaseConfig::from_env_with(&env);
            Some(match database_url {
                Some(url) => config.with_url(url),
                None => config,
            })
        } else {
            None
        };

        Ok(CliConfig {
            players: overrides
                .players
                .unwrap_or_else(|| parse_env_or(&env, "PADEL_PLAYERS", 8)),
            courts: overrides
                .courts
                .unwrap_or_else(|| parse_env_or(&env, "PADEL_COURTS", 2)),
            rounds: overrides
                .rounds
                .unwrap_or_else(|| parse_env_or(&env, "PADEL_ROUNDS", 3)),
            points_per_match: overrides
                .points_per_match
                .unwrap_or_else(|| parse_env_or(&env, "PADEL_POINTS_PER_MATCH", 21)),
            format,
            final_match,
            play_final: overrides.play_final || parse_env_or(&env, "PADEL_PLAY_FINAL", false),
            seed: overrides
                .seed
                .or_else(|| env("PADEL_SEED").and_then(|v| v.parse().ok())),
            database,
            json: overrides.json,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.players < 4 || self.players % 4 != 0 {
            return Err(ConfigError::Invalid {
                var: "PADEL_PLAYERS".to_string(),
                reason: format!("Must be a positive multiple of 4, got {}", self.players),
            });
        }

        let needed = self.players / 4;
        if (self.courts as usize) < needed {
            return Err(ConfigError::Invalid {
                var: "PADEL_COURTS".to_string(),
                reason: format!("{} players need at least {needed} courts", self.players),
            });
        }

        if self.rounds == 0 {
            return Err(ConfigError::Invalid {
                var: "PADEL_ROUNDS".to_string(),
                reason: "Must be at least 1".to_string(),
            });
        }

        if !(1..=50).contains(&self.points_per_match) {
            return Err(ConfigError::Invalid {
                var: "PADEL_POINTS_PER_MATCH".to_string(),
                reason: format!("Must be between 1 and 50, got {}", self.points_per_match),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an environment variable with default fallback
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
    use std::collections::HashMap;

    fn resolve_with(
        overrides: CliOverrides,
        vars: &[(&str, &str)],
    ) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::resolve(overrides, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = resolve_with(CliOverrides::default(), &[]).unwrap();
        assert_eq!(config.players, 8);
        assert_eq!(config.courts, 2);
        assert_eq!(config.format, TournamentFormat::Americano);
        assert_eq!(config.final_match, FinalMatchPattern::OneTwoVsThreeFour);
        assert!(config.database.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override_environment() {
        let overrides = CliOverrides {
            players: Some(12),
            format: Some("mexicano".to_string()),
            ..Default::default()
        };
        let config = resolve_with(
            overrides,
            &[
                ("PADEL_PLAYERS", "16"),
                ("PADEL_COURTS", "3"),
                ("PADEL_SEED", "42"),
                ("PADEL_FORMAT", "AMERICANO"),
            ],
        )
        .unwrap();

        assert_eq!(config.players, 12);
        assert_eq!(config.courts, 3);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.format, TournamentFormat::Mexicano);
    }

    #[test]
    fn test_unknown_values_rejected() {
        let err = resolve_with(CliOverrides::default(), &[("PADEL_FORMAT", "swiss")]).unwrap_err();
        assert!(err.to_string().contains("PADEL_FORMAT"));

        let overrides = CliOverrides {
            final_match: Some(4),
            ..Default::default()
        };
        assert!(resolve_with(overrides, &[]).is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = resolve_with(CliOverrides::default(), &[]).unwrap();

        config.players = 10;
        assert!(config.validate().is_err());

        config.players = 12;
        config.courts = 2;
        assert!(config.validate().is_err());

        config.courts = 3;
        config.points_per_match = 0;
        assert!(config.validate().is_err());

        config.points_per_match = 24;
        config.rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgres_uses_url_override() {
        let overrides = CliOverrides {
            postgres: true,
            database_url: Some("postgres://localhost/padel_test".to_string()),
            ..Default::default()
        };
        let config = resolve_with(overrides, &[]).unwrap();
        assert_eq!(
            config.database.unwrap().database_url,
            "postgres://localhost/padel_test"
        );
    }

    #[test]
    fn test_database_settings_come_from_injected_environment() {
        let config = resolve_with(
            CliOverrides::default(),
            &[
                ("PADEL_POSTGRES", "true"),
                ("DATABASE_URL", "postgres://env/padel"),
                ("DB_MAX_CONNECTIONS", "3"),
            ],
        )
        .unwrap();

        let database = config.database.unwrap();
        assert_eq!(database.database_url, "postgres://env/padel");
        assert_eq!(database.max_connections, 3);
    }
}
