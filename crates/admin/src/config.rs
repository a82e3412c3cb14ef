//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `OLIVO_DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `OLIVO_DB_MAX_CONNECTIONS` - Connection pool size (default: 10)
//! - `OLIVO_BULK_MAX_RECORDS` - Largest accepted bulk batch (default: 5000)

use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_BULK_MAX_RECORDS: usize = 5000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Admin catalog configuration.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Bulk submissions larger than this are rejected as malformed
    pub bulk_max_records: usize,
}

impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("bulk_max_records", &self.bulk_max_records)
            .finish()
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("OLIVO_DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("OLIVO_DATABASE_URL".to_string()))?;

        let max_connections: u32 = parse_or(&lookup, "OLIVO_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "OLIVO_DB_MAX_CONNECTIONS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let bulk_max_records: usize = parse_or(&lookup, "OLIVO_BULK_MAX_RECORDS", DEFAULT_BULK_MAX_RECORDS)?;
        if bulk_max_records == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "OLIVO_BULK_MAX_RECORDS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
            bulk_max_records,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AdminConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AdminConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_database_url_required() {
        assert!(matches!(config(&[]), Err(ConfigError::MissingEnvVar(_))));
        assert!(matches!(
            config(&[("OLIVO_DATABASE_URL", "  ")]),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_defaults_and_overrides() {
        let config_default = config(&[("OLIVO_DATABASE_URL", "postgres://localhost/olivo")]).unwrap();
        assert_eq!(config_default.max_connections, 10);
        assert_eq!(config_default.bulk_max_records, 5000);
        assert_eq!(
            config_default.database_url.expose_secret(),
            "postgres://localhost/olivo"
        );

        let custom = config(&[
            ("OLIVO_DATABASE_URL", "postgres://localhost/olivo"),
            ("OLIVO_DB_MAX_CONNECTIONS", "4"),
            ("OLIVO_BULK_MAX_RECORDS", "200"),
        ])
        .unwrap();
        assert_eq!(custom.max_connections, 4);
        assert_eq!(custom.bulk_max_records, 200);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[
                ("OLIVO_DATABASE_URL", "postgres://localhost/olivo"),
                ("OLIVO_BULK_MAX_RECORDS", "lots"),
            ]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            config(&[
                ("OLIVO_DATABASE_URL", "postgres://localhost/olivo"),
                ("OLIVO_DB_MAX_CONNECTIONS", "0"),
            ]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_debug_redacts_url() {
        let config = config(&[("OLIVO_DATABASE_URL", "postgres://user:hunter2@db/olivo")]).unwrap();
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
