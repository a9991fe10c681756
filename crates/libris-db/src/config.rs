//! Library configuration.
//!
//! Loaded from environment variables with fallback to defaults.
//!
//! | Variable                   | Default        |
//! |----------------------------|----------------|
//! | `LIBRIS_DATABASE_PATH`     | `./libris.db`  |
//! | `LIBRIS_LOAN_PERIOD_DAYS`  | `14`           |
//! | `LIBRIS_MAX_ACTIVE_LOANS`  | `3`            |
//! | `LIBRIS_DAILY_FINE_CENTS`  | `50`           |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use libris_core::{LendingPolicy, Money};
use serde::{Deserialize, Serialize};

use crate::pool::DbConfig;

pub const DATABASE_PATH_VAR: &str = "LIBRIS_DATABASE_PATH";
pub const LOAN_PERIOD_DAYS_VAR: &str = "LIBRIS_LOAN_PERIOD_DAYS";
pub const MAX_ACTIVE_LOANS_VAR: &str = "LIBRIS_MAX_ACTIVE_LOANS";
pub const DAILY_FINE_CENTS_VAR: &str = "LIBRIS_DAILY_FINE_CENTS";

const DEFAULT_DATABASE_PATH: &str = "./libris.db";

/// Library configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Loan period, borrow limit and fine rate
    pub policy: LendingPolicy,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            policy: LendingPolicy::default(),
        }
    }
}

impl LibraryConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value (if set).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LendingPolicy::default();

        let config = LibraryConfig {
            database_path: lookup(DATABASE_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH)),

            policy: LendingPolicy {
                loan_period_days: parse_or(&lookup, LOAN_PERIOD_DAYS_VAR, defaults.loan_period_days)?,
                max_active_loans: parse_or(&lookup, MAX_ACTIVE_LOANS_VAR, defaults.max_active_loans)?,
                daily_fine: Money::from_cents(parse_or(
                    &lookup,
                    DAILY_FINE_CENTS_VAR,
                    defaults.daily_fine.cents(),
                )?),
            },
        };

        if config.policy.loan_period_days < 1 {
            return Err(ConfigError::InvalidValue(LOAN_PERIOD_DAYS_VAR.to_string()));
        }
        if config.policy.max_active_loans < 1 {
            return Err(ConfigError::InvalidValue(MAX_ACTIVE_LOANS_VAR.to_string()));
        }
        if config.policy.daily_fine.cents() < 0 {
            return Err(ConfigError::InvalidValue(DAILY_FINE_CENTS_VAR.to_string()));
        }

        Ok(config)
    }

    /// Pool configuration for the configured database file.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
