//! Manager configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{ManagerError, ManagerResult};
use std::env;
use std::time::Duration;

// =============================================================================
// Configuration
// =============================================================================

/// Manager configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database configuration
    pub database: DatabaseConfig,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string from `DATABASE_URL`; `kioskctl` refuses to start without it
    pub url: Option<String>,
    /// Pool size
    pub max_connections: u32,
    /// Longest wait for a collection lock before the operation fails
    pub lock_timeout: Duration,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment (in-memory store)
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> ManagerResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let environment = Self::load_environment()?;
        let database = Self::load_database_config()?;

        Ok(Self {
            database,
            environment,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            database: DatabaseConfig {
                url: None,
                max_connections: 1,
                lock_timeout: Duration::from_millis(500),
            },
            environment: Environment::Test,
        }
    }

    fn load_environment() -> ManagerResult<Environment> {
        let env_str = env::var("KIOSK_ENV").unwrap_or_else(|_| "development".to_string());

        match env_str.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ManagerError::Config(format!(
                "Invalid KIOSK_ENV: {}. Expected: test, development, production",
                other
            ))),
        }
    }

    fn load_database_config() -> ManagerResult<DatabaseConfig> {
        let url = env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty());
        let max_connections =
            Self::load_number_env("KIOSK_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS as u64)?;
        let lock_timeout_ms =
            Self::load_number_env("KIOSK_LOCK_TIMEOUT_MS", DEFAULT_LOCK_TIMEOUT_MS)?;

        let max_connections = u32::try_from(max_connections)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ManagerError::Config(format!(
                    "Invalid KIOSK_DB_MAX_CONNECTIONS: {}",
                    max_connections
                ))
            })?;

        Ok(DatabaseConfig {
            url,
            max_connections,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        })
    }

    fn load_number_env(key: &str, default: u64) -> ManagerResult<u64> {
        match env::var(key) {
            Ok(val) => val
                .trim()
                .parse::<u64>()
                .map_err(|_| ManagerError::Config(format!("Invalid {} value: {}", key, val))),
            Err(_) => Ok(default),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: None,
                max_connections: DEFAULT_MAX_CONNECTIONS,
                lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            },
            environment: Environment::Development,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.lock_timeout, Duration::from_secs(5));
        assert!(config.database.url.is_none());
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test();

        assert_eq!(config.database.max_connections, 1);
        assert_eq!(config.environment, Environment::Test);
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
    }
}
