//! In-memory session for exercising the reconciler without a database.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use pgshift_core::error::{Result, ShiftError};

use crate::migrations::ledger::{self, LedgerEntry};
use crate::migrations::{MigrationSession, ScriptSession};

/// Records every statement and stages ledger writes until commit.
#[derive(Debug, Default)]
pub struct MemorySession {
    /// Committed ledger.
    pub ledger: Vec<LedgerEntry>,
    /// Working copy while a transaction is open.
    staged: Option<Vec<LedgerEntry>>,
    /// Every statement attempted, in order, including the failing one.
    pub executed: Vec<String>,
    /// Statements containing this text fail like a syntax error.
    fail_marker: Option<String>,
    pub ensure_calls: usize,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    ticks: i64,
}

impl MemorySession {
    /// Ledger with `names` applied one second apart, in the given order.
    pub fn with_applied(names: &[&str]) -> Self {
        let entries: Vec<(&str, i64)> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, i as i64))
            .collect();
        Self::with_entries(&entries)
    }

    /// Ledger with explicit `(name, seconds)` timestamps.
    pub fn with_entries(entries: &[(&str, i64)]) -> Self {
        let ticks = entries.iter().map(|(_, t)| *t).max().unwrap_or(0) + 1;
        Self {
            ledger: entries
                .iter()
                .map(|(name, t)| LedgerEntry::new(*name, at(*t)))
                .collect(),
            ticks,
            ..Default::default()
        }
    }

    pub fn fail_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Committed ledger names, sorted.
    pub fn ledger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ledger.iter().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    fn staged_mut(&mut self) -> Result<&mut Vec<LedgerEntry>> {
        self.staged
            .as_mut()
            .ok_or_else(|| ShiftError::Database("No open transaction".into()))
    }
}

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(seconds)
}

#[async_trait]
impl ScriptSession for MemorySession {
    async fn begin(&mut self) -> Result<()> {
        if self.staged.is_some() {
            return Err(ShiftError::Database("Transaction already open".into()));
        }
        self.begins += 1;
        self.staged = Some(self.ledger.clone());
        Ok(())
    }

    async fn execute_statement(&mut self, statement: &str) -> Result<()> {
        self.executed.push(statement.to_string());
        match &self.fail_marker {
            Some(marker) if statement.contains(marker.as_str()) => Err(ShiftError::Database(
                format!("syntax error at or near \"{}\"", marker),
            )),
            _ => Ok(()),
        }
    }

    async fn commit(&mut self) -> Result<()> {
        let staged = self
            .staged
            .take()
            .ok_or_else(|| ShiftError::Database("No open transaction to commit".into()))?;
        self.commits += 1;
        self.ledger = staged;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.staged.take().is_some() {
            self.rollbacks += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl MigrationSession for MemorySession {
    async fn ensure_ledger(&mut self) -> Result<()> {
        self.ensure_calls += 1;
        Ok(())
    }

    async fn applied(&mut self) -> Result<Vec<LedgerEntry>> {
        let mut entries = self.ledger.clone();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn latest(&mut self) -> Result<Option<LedgerEntry>> {
        Ok(ledger::latest(&self.ledger).cloned())
    }

    async fn record(&mut self, name: &str) -> Result<()> {
        let applied_at = at(self.ticks);
        self.ticks += 1;
        let staged = self.staged_mut()?;
        if staged.iter().any(|e| e.name == name) {
            return Err(ShiftError::Database(format!(
                "duplicate key value violates unique constraint \"migrations_name_key\": {}",
                name
            )));
        }
        staged.push(LedgerEntry::new(name, applied_at));
        Ok(())
    }

    async fn forget(&mut self, name: &str) -> Result<()> {
        self.staged_mut()?.retain(|e| e.name != name);
        Ok(())
    }
}
