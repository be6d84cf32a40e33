use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use pgshift_core::error::{Result, ShiftError};

use super::ledger::{self, LedgerEntry};
use super::split::split_statements;

/// Runs trusted SQL, optionally inside one transaction.
///
/// Scripts executed here are user-authored files and are not sanitized.
#[async_trait]
pub trait ScriptSession: Send {
    /// Open the transaction that subsequent statements and ledger writes join.
    async fn begin(&mut self) -> Result<()>;

    /// Execute one statement verbatim.
    ///
    /// A failure reported by the server is returned as
    /// [`ShiftError::Database`] carrying the driver's message.
    async fn execute_statement(&mut self, statement: &str) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}

/// Ledger access on top of script execution. All ledger queries are parameterized.
#[async_trait]
pub trait MigrationSession: ScriptSession {
    /// Create the ledger table if it is absent.
    async fn ensure_ledger(&mut self) -> Result<()>;

    /// All ledger rows, ordered by name.
    async fn applied(&mut self) -> Result<Vec<LedgerEntry>>;

    /// The row with the latest `applied_at`, ties resolved by greatest name.
    async fn latest(&mut self) -> Result<Option<LedgerEntry>>;

    /// Insert a ledger row. Must run inside the open transaction.
    async fn record(&mut self, name: &str) -> Result<()>;

    /// Delete a ledger row. Must run inside the open transaction.
    async fn forget(&mut self, name: &str) -> Result<()>;
}

/// Split `sql` and execute each statement. Returns the number executed.
///
/// Statement failures surface as [`ShiftError::Migration`] labelled with `label`.
pub async fn execute_script<S>(session: &mut S, label: &str, sql: &str) -> Result<usize>
where
    S: ScriptSession + ?Sized,
{
    let statements = split_statements(sql);
    for statement in &statements {
        session
            .execute_statement(statement)
            .await
            .map_err(|e| match e {
                ShiftError::Database(message) => ShiftError::migration(label, message),
                other => other,
            })?;
    }
    debug!("Executed {} statement(s) for {}", statements.len(), label);
    Ok(statements.len())
}

/// Commit on success, roll back on failure.
///
/// A rollback failure is logged; the original error is the one returned.
pub async fn finish<S, T>(session: &mut S, outcome: Result<T>) -> Result<T>
where
    S: ScriptSession + ?Sized,
{
    match outcome {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = session.rollback().await {
                warn!("Failed to roll back transaction: {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// PostgreSQL session backed by a pool and at most one open transaction.
///
/// Dropping the session with a transaction still open rolls it back.
pub struct PgSession {
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgSession {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, tx: None }
    }

    fn tx_mut(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        self.tx
            .as_mut()
            .ok_or_else(|| ShiftError::Database("No open transaction".into()))
    }
}

/// The server's own message when there is one, else the client error.
fn driver_message(e: &sqlx::Error) -> String {
    match e.as_database_error() {
        Some(db) => db.message().to_string(),
        None => e.to_string(),
    }
}

#[async_trait]
impl ScriptSession for PgSession {
    async fn begin(&mut self) -> Result<()> {
        if self.tx.is_some() {
            return Err(ShiftError::Database("Transaction already open".into()));
        }
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ShiftError::Database(format!("Failed to begin transaction: {}", e)))?;
        self.tx = Some(tx);
        debug!("Transaction opened");
        Ok(())
    }

    async fn execute_statement(&mut self, statement: &str) -> Result<()> {
        // Going through the connection keeps the future Send.
        let result = match self.tx.as_mut() {
            Some(tx) => {
                let conn: &mut PgConnection = &mut *tx;
                conn.execute(sqlx::raw_sql(statement)).await
            }
            None => sqlx::raw_sql(statement).execute(&self.pool).await,
        };
        result
            .map(|_| ())
            .map_err(|e| ShiftError::Database(driver_message(&e)))
    }

    async fn commit(&mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| ShiftError::Database("No open transaction to commit".into()))?;
        tx.commit()
            .await
            .map_err(|e| ShiftError::Database(format!("Failed to commit: {}", e)))?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback()
                .await
                .map_err(|e| ShiftError::Database(format!("Failed to roll back: {}", e)))?;
            debug!("Transaction rolled back");
        }
        Ok(())
    }
}

#[async_trait]
impl MigrationSession for PgSession {
    async fn ensure_ledger(&mut self) -> Result<()> {
        sqlx::query(ledger::CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                ShiftError::Database(format!("Failed to create migrations table: {}", e))
            })?;
        Ok(())
    }

    async fn applied(&mut self) -> Result<Vec<LedgerEntry>> {
        let rows: Vec<(String, DateTime<Utc>)> = sqlx::query_as(ledger::SELECT_APPLIED)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                ShiftError::Database(format!("Failed to get applied migrations: {}", e))
            })?;

        Ok(rows
            .into_iter()
            .map(|(name, applied_at)| LedgerEntry { name, applied_at })
            .collect())
    }

    async fn latest(&mut self) -> Result<Option<LedgerEntry>> {
        let row: Option<(String, DateTime<Utc>)> = sqlx::query_as(ledger::SELECT_LATEST)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ShiftError::Database(format!("Failed to get last migration: {}", e)))?;

        Ok(row.map(|(name, applied_at)| LedgerEntry { name, applied_at }))
    }

    async fn record(&mut self, name: &str) -> Result<()> {
        let tx = self.tx_mut()?;
        sqlx::query(ledger::INSERT)
            .bind(name)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                ShiftError::Database(format!("Failed to record migration '{}': {}", name, e))
            })?;
        Ok(())
    }

    async fn forget(&mut self, name: &str) -> Result<()> {
        let tx = self.tx_mut()?;
        sqlx::query(ledger::DELETE)
            .bind(name)
            .execute(&mut **tx)
            .await
            .map_err(|e| {
                ShiftError::Database(format!(
                    "Failed to remove migration record '{}': {}",
                    name, e
                ))
            })?;
        Ok(())
    }
}
