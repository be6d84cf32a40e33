//! Reconciles the migrations on disk with the ledger.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use pgshift_core::error::Result;

use super::session::{execute_script, finish, MigrationSession};
use super::split::is_blank;
use super::status::StatusReport;
use super::store::MigrationStore;

/// Outcome of applying pending migrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Migrations executed and recorded, in order.
    pub applied: Vec<String>,
    /// Pending migrations left alone because `up.sql` is missing or blank.
    pub skipped: Vec<String>,
    pub statements: usize,
}

impl ApplyReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Outcome of reverting the latest migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevertReport {
    pub name: String,
    /// Whether a `down.sql` body was executed.
    pub ran_script: bool,
    pub statements: usize,
}

/// `sort(on_disk \ applied)`.
pub fn pending_migrations(on_disk: &[String], applied: &HashSet<String>) -> Vec<String> {
    on_disk
        .iter()
        .filter(|name| !applied.contains(name.as_str()))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Applies pending migrations and reverts the latest one.
pub struct Reconciler<S> {
    session: S,
    store: MigrationStore,
}

impl<S: MigrationSession> Reconciler<S> {
    pub fn new(session: S, store: MigrationStore) -> Self {
        Self { session, store }
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Names on disk that have no ledger row, in application order.
    pub async fn pending(&mut self) -> Result<Vec<String>> {
        let on_disk = self.store.list()?;
        self.session.ensure_ledger().await?;
        let applied = self.applied_names().await?;
        Ok(pending_migrations(&on_disk, &applied))
    }

    /// Apply every pending migration inside a single transaction.
    ///
    /// Each `up.sql` runs and its ledger row is inserted before the next one
    /// starts. Any failure rolls back the whole batch. Pending migrations
    /// without a usable `up.sql` are skipped with a warning and stay pending.
    pub async fn apply_pending(&mut self) -> Result<ApplyReport> {
        let pending = self.pending().await?;
        let mut report = ApplyReport::default();

        let mut batch = Vec::new();
        for name in pending {
            match self.store.read_up(&name)? {
                Some(sql) if !is_blank(&sql) => batch.push((name, sql)),
                Some(_) => {
                    warn!("Skipping {}: up.sql is empty", name);
                    report.skipped.push(name);
                }
                None => {
                    warn!("Skipping {}: up.sql not found", name);
                    report.skipped.push(name);
                }
            }
        }

        if batch.is_empty() {
            debug!("No pending migrations to apply");
            return Ok(report);
        }

        self.session.begin().await?;
        let outcome = apply_batch(&mut self.session, &batch).await;
        let (applied, statements) = finish(&mut self.session, outcome).await?;

        report.applied = applied;
        report.statements = statements;
        info!("Applied {} migration(s)", report.applied.len());
        Ok(report)
    }

    /// Revert the latest ledger entry. Returns `None` when the ledger is empty.
    ///
    /// A missing, unreadable or blank `down.sql` skips only the SQL step; the
    /// ledger row is still deleted. Script and delete commit together.
    pub async fn revert_last(&mut self) -> Result<Option<RevertReport>> {
        self.store.ensure_exists()?;
        self.session.ensure_ledger().await?;

        let Some(entry) = self.session.latest().await? else {
            debug!("Ledger is empty, nothing to revert");
            return Ok(None);
        };
        let name = entry.name;

        let down = match self.store.read_down(&name) {
            Ok(Some(sql)) if !is_blank(&sql) => Some(sql),
            Ok(Some(_)) => {
                warn!("{}: down.sql is empty, removing ledger entry only", name);
                None
            }
            Ok(None) => {
                warn!("{}: down.sql not found, removing ledger entry only", name);
                None
            }
            Err(e) => {
                warn!(
                    "{}: could not read down.sql ({}), removing ledger entry only",
                    name, e
                );
                None
            }
        };

        self.session.begin().await?;
        let outcome = revert_one(&mut self.session, &name, down.as_deref()).await;
        let statements = finish(&mut self.session, outcome).await?;

        info!("Reverted migration: {}", name);
        Ok(Some(RevertReport {
            ran_script: down.is_some(),
            name,
            statements,
        }))
    }

    /// Applied/pending state of every on-disk migration.
    pub async fn status(&mut self) -> Result<StatusReport> {
        let on_disk = self.store.list()?;
        self.session.ensure_ledger().await?;
        let ledger = self.session.applied().await?;
        let store = &self.store;
        Ok(StatusReport::build(&on_disk, &ledger, |name| store.has_down(name)))
    }

    async fn applied_names(&mut self) -> Result<HashSet<String>> {
        let names: HashSet<String> = self
            .session
            .applied()
            .await?
            .into_iter()
            .map(|e| e.name)
            .collect();
        debug!("Already applied migrations: {:?}", names);
        Ok(names)
    }
}

async fn apply_batch<S: MigrationSession>(
    session: &mut S,
    batch: &[(String, String)],
) -> Result<(Vec<String>, usize)> {
    let mut applied = Vec::with_capacity(batch.len());
    let mut statements = 0;
    for (name, sql) in batch {
        info!("Applying migration: {}", name);
        statements += execute_script(session, name, sql).await?;
        session.record(name).await?;
        applied.push(name.clone());
    }
    Ok((applied, statements))
}

async fn revert_one<S: MigrationSession>(
    session: &mut S,
    name: &str,
    down: Option<&str>,
) -> Result<usize> {
    let statements = match down {
        Some(sql) => execute_script(session, name, sql).await?,
        None => 0,
    };
    session.forget(name).await?;
    Ok(statements)
}
