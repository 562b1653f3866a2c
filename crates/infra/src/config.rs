//! Runtime configuration.
//!
//! Configuration is an explicit value built once at startup and handed to
//! the services that need it; nothing below the binary reads the environment.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_UNIT_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(900);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Malformed {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")]
    MissingDatabaseUrl,
}

/// Postgres connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Everything the ledger backend needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub listen_addr: String,
    pub jwt_secret: String,
    /// `None` selects the in-memory store.
    pub database: Option<DatabaseConfig>,
    /// Upper bound on a single atomic unit.
    pub unit_timeout: Duration,
    pub token_ttl: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            database: None,
            unit_timeout: DEFAULT_UNIT_TIMEOUT,
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                defaults.jwt_secret
            }
        };

        let use_persistent = lookup("USE_PERSISTENT_STORES")
            .map(|v| parse_bool("USE_PERSISTENT_STORES", &v))
            .transpose()?
            .unwrap_or(false);

        let database = if use_persistent {
            let url = lookup("DATABASE_URL")
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::MissingDatabaseUrl)?;
            let max_connections = parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                "a positive integer",
                DEFAULT_MAX_CONNECTIONS,
            )?;
            Some(DatabaseConfig {
                url,
                max_connections,
            })
        } else {
            None
        };

        let unit_timeout_ms: u64 = parse_or(
            &lookup,
            "LEDGER_UNIT_TIMEOUT_MS",
            "a number of milliseconds",
            DEFAULT_UNIT_TIMEOUT.as_millis() as u64,
        )?;
        let token_ttl_secs: u64 = parse_or(
            &lookup,
            "TOKEN_TTL_SECONDS",
            "a number of seconds",
            DEFAULT_TOKEN_TTL.as_secs(),
        )?;

        Ok(Self {
            listen_addr: lookup("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            jwt_secret,
            database,
            unit_timeout: Duration::from_millis(unit_timeout_ms),
            token_ttl: Duration::from_secs(token_ttl_secs),
        })
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    value
        .trim()
        .parse::<bool>()
        .map_err(|_| ConfigError::Malformed {
            name,
            expected: "true or false",
            value: value.to_string(),
        })
}

fn parse_or<F, T>(
    lookup: &F,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + Default,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) if v > T::default() => Ok(v),
            _ => Err(ConfigError::Malformed {
                name,
                expected,
                value: raw,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = LedgerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert!(config.database.is_none());
    }

    #[test]
    fn persistent_stores_require_database_url() {
        let err = LedgerConfig::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "true")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingDatabaseUrl);
    }

    #[test]
    fn reads_every_variable() {
        let config = LedgerConfig::from_lookup(lookup(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/bank"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("LEDGER_UNIT_TIMEOUT_MS", "250"),
            ("TOKEN_TTL_SECONDS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(
            config.database,
            Some(DatabaseConfig {
                url: "postgres://localhost/bank".to_string(),
                max_connections: 4,
            })
        );
        assert_eq!(config.unit_timeout, Duration::from_millis(250));
        assert_eq!(config.token_ttl, Duration::from_secs(60));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = LedgerConfig::from_lookup(lookup(&[("LEDGER_UNIT_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Malformed {
                name: "LEDGER_UNIT_TIMEOUT_MS",
                ..
            }
        ));

        let err = LedgerConfig::from_lookup(lookup(&[("TOKEN_TTL_SECONDS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }

    #[test]
    fn malformed_flag_is_rejected() {
        let err =
            LedgerConfig::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "yes")])).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
    }
}
