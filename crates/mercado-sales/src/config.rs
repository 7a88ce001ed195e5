//! Sale engine configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use mercado_db::DbConfig;

/// Which sales a producer may delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionPolicy {
    /// Any status, including approved and completed.
    #[default]
    AnyStatus,
    /// Only sales that have not reached approval.
    BeforeApproval,
}

impl DeletionPolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeletionPolicy::AnyStatus => "any_status",
            DeletionPolicy::BeforeApproval => "before_approval",
        }
    }
}

impl fmt::Display for DeletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeletionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any_status" => Ok(DeletionPolicy::AnyStatus),
            "before_approval" => Ok(DeletionPolicy::BeforeApproval),
            _ => Err(ConfigError::InvalidValue("MERCADO_DELETION_POLICY".to_string())),
        }
    }
}

/// Sale engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size (default: 10)
    pub db_max_connections: u32,

    /// How long an admitted operation waits for a pooled connection
    pub db_acquire_timeout: Duration,

    /// Operations allowed to wait beyond the pool size before new ones are refused
    pub max_pending_operations: usize,

    /// Per-operation deadline
    pub operation_deadline: Duration,

    /// Root directory of the local voucher store
    pub storage_root: PathBuf,

    pub deletion_policy: DeletionPolicy,
}

impl Default for SalesConfig {
    fn default() -> Self {
        SalesConfig {
            database_path: PathBuf::from("./data/mercado.db"),
            db_max_connections: 10,
            db_acquire_timeout: Duration::from_secs(30),
            max_pending_operations: 64,
            operation_deadline: Duration::from_millis(15_000),
            storage_root: PathBuf::from("./data/objects"),
            deletion_policy: DeletionPolicy::AnyStatus,
        }
    }
}

impl SalesConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let config = SalesConfig {
            database_path: PathBuf::from(var("MERCADO_DATABASE_PATH", "./data/mercado.db")),

            db_max_connections: var("MERCADO_DB_MAX_CONNECTIONS", "10")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("MERCADO_DB_MAX_CONNECTIONS".to_string()))?,

            db_acquire_timeout: var("MERCADO_DB_ACQUIRE_TIMEOUT_SECS", "30")
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| {
                    ConfigError::InvalidValue("MERCADO_DB_ACQUIRE_TIMEOUT_SECS".to_string())
                })?,

            max_pending_operations: var("MERCADO_MAX_PENDING_OPERATIONS", "64")
                .parse()
                .map_err(|_| {
                    ConfigError::InvalidValue("MERCADO_MAX_PENDING_OPERATIONS".to_string())
                })?,

            operation_deadline: var("MERCADO_OPERATION_DEADLINE_MS", "15000")
                .parse()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidValue("MERCADO_OPERATION_DEADLINE_MS".to_string()))?,

            storage_root: PathBuf::from(var("MERCADO_STORAGE_ROOT", "./data/objects")),

            deletion_policy: var("MERCADO_DELETION_POLICY", "any_status").parse()?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("MERCADO_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.operation_deadline.is_zero() {
            return Err(ConfigError::InvalidValue("MERCADO_OPERATION_DEADLINE_MS".to_string()));
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .connect_timeout(self.db_acquire_timeout)
    }

    /// Size of the admission gate: every pooled connection plus the pending queue.
    pub fn admission_limit(&self) -> usize {
        self.db_max_connections as usize + self.max_pending_operations
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SalesConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("./data/mercado.db"));
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.operation_deadline, Duration::from_millis(15_000));
        assert_eq!(config.deletion_policy, DeletionPolicy::AnyStatus);
        assert_eq!(config.admission_limit(), 74);
    }

    #[test]
    fn test_overrides() {
        let config = SalesConfig::from_lookup(lookup(&[
            ("MERCADO_DB_MAX_CONNECTIONS", "4"),
            ("MERCADO_MAX_PENDING_OPERATIONS", "0"),
            ("MERCADO_OPERATION_DEADLINE_MS", "250"),
            ("MERCADO_DELETION_POLICY", "BEFORE_APPROVAL"),
            ("MERCADO_STORAGE_ROOT", "/var/lib/mercado"),
        ]))
        .unwrap();

        assert_eq!(config.admission_limit(), 4);
        assert_eq!(config.operation_deadline, Duration::from_millis(250));
        assert_eq!(config.deletion_policy, DeletionPolicy::BeforeApproval);
        assert_eq!(config.storage_root, PathBuf::from("/var/lib/mercado"));
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = SalesConfig::from_lookup(lookup(&[("MERCADO_DB_MAX_CONNECTIONS", "ten")])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for MERCADO_DB_MAX_CONNECTIONS");

        let err = SalesConfig::from_lookup(lookup(&[("MERCADO_DB_MAX_CONNECTIONS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name) if name == "MERCADO_DB_MAX_CONNECTIONS"));

        let err = SalesConfig::from_lookup(lookup(&[("MERCADO_DELETION_POLICY", "never")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name) if name == "MERCADO_DELETION_POLICY"));
    }
}
