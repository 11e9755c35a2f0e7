use std::time::Duration;

use anyhow::Context;
use atelier_db::DEFAULT_MAX_CONNECTIONS;

/// Default time each background task gets to stop after a shutdown signal.
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Worker process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Postgres connection string.
    pub database_url: String,
    /// Pool size (default: `20`).
    pub max_connections: u32,
    /// Per-task grace period during shutdown (default: `5s`).
    pub shutdown_timeout: Duration,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                    | Default    |
    /// |----------------------------|------------|
    /// | `DATABASE_URL`             | (required) |
    /// | `DATABASE_MAX_CONNECTIONS` | `20`       |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `5`        |
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let shutdown_timeout_secs = match lookup("SHUTDOWN_TIMEOUT_SECS") {
            Some(v) => v
                .parse::<u64>()
                .context("SHUTDOWN_TIMEOUT_SECS must be a valid u64")?,
            None => DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url,
            max_connections,
            shutdown_timeout: Duration::from_secs(shutdown_timeout_secs),
        })
    }
}
