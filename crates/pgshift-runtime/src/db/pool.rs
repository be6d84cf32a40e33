use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use pgshift_core::config::DatabaseConfig;
use pgshift_core::error::{Result, ShiftError};

use crate::migrations::PgSession;

/// Short-lived connection pool for one command invocation.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to `url` using the pool settings from `config`.
    ///
    /// The URL is passed separately so the caller decides where it came from.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size.max(1))
            .acquire_timeout(Duration::from_secs(config.pool_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| ShiftError::Database(format!("Failed to connect: {}", e)))?;

        debug!("Connected with pool size {}", config.pool_size.max(1));
        Ok(Self { pool })
    }

    /// Open a session for running trusted scripts and ledger queries.
    pub fn session(&self) -> PgSession {
        PgSession::new(self.pool.clone())
    }

    /// Close all connections gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Connection pool closed");
    }
}
