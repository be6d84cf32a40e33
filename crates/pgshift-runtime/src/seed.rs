//! Running seed data scripts.
//!
//! Seeds are not tracked in the ledger. Every run executes all of them, so
//! they should be written to be re-runnable.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use pgshift_core::error::{Result, ShiftError};

use crate::migrations::split::is_blank;
use crate::migrations::{execute_script, finish, ScriptSession};

/// Outcome of one seed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
    pub statements: usize,
}

/// Executes every `*.sql` file in a directory inside one transaction.
pub struct Seeder<S> {
    session: S,
    dir: PathBuf,
}

impl<S: ScriptSession> Seeder<S> {
    pub fn new(session: S, dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            dir: dir.into(),
        }
    }

    pub fn into_session(self) -> S {
        self.session
    }

    pub async fn run(&mut self) -> Result<SeedReport> {
        let files = seed_files(&self.dir)?;
        let mut report = SeedReport::default();

        let mut batch = Vec::new();
        for (name, path) in files {
            let sql = std::fs::read_to_string(&path)?;
            if is_blank(&sql) {
                warn!("Skipping seed {}: file is empty", name);
                report.skipped.push(name);
            } else {
                batch.push((name, sql));
            }
        }

        if batch.is_empty() {
            debug!("No seed scripts to run in {}", self.dir.display());
            return Ok(report);
        }

        self.session.begin().await?;
        let outcome = run_batch(&mut self.session, &batch).await;
        let (executed, statements) = finish(&mut self.session, outcome).await?;

        report.executed = executed;
        report.statements = statements;
        info!("Ran {} seed script(s)", report.executed.len());
        Ok(report)
    }
}

async fn run_batch<S: ScriptSession>(
    session: &mut S,
    batch: &[(String, String)],
) -> Result<(Vec<String>, usize)> {
    let mut executed = Vec::with_capacity(batch.len());
    let mut statements = 0;
    for (name, sql) in batch {
        info!("Seeding: {}", name);
        statements += execute_script(session, name, sql).await?;
        executed.push(name.clone());
    }
    Ok((executed, statements))
}

/// `*.sql` files directly inside `dir`, sorted by file name.
fn seed_files(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !dir.is_dir() {
        return Err(ShiftError::Config(format!(
            "Seeds directory not found: {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path.extension().map(|e| e != "sql").unwrap_or(true) {
            continue;
        }
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ShiftError::Config("Invalid seed filename".into()))?
            .to_string();
        files.push((name, path));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySession;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_seeds_run_sorted_in_one_transaction() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("02_posts.sql"), "INSERT INTO posts VALUES (1);").unwrap();
        fs::write(dir.path().join("01_users.sql"), "INSERT INTO users VALUES (1);").unwrap();
        fs::write(dir.path().join("notes.txt"), "SELECT 'ignored';").unwrap();

        let mut seeder = Seeder::new(MemorySession::default(), dir.path());
        let report = seeder.run().await.unwrap();

        assert_eq!(report.executed, vec!["01_users.sql", "02_posts.sql"]);
        assert_eq!(report.statements, 2);
        let session = seeder.into_session();
        assert_eq!(
            session.executed,
            vec!["INSERT INTO users VALUES (1)", "INSERT INTO posts VALUES (1)"]
        );
        assert_eq!(session.begins, 1);
        assert_eq!(session.commits, 1);
    }

    #[tokio::test]
    async fn test_seed_failure_rolls_back() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("01_ok.sql"), "INSERT INTO t VALUES (1);").unwrap();
        fs::write(dir.path().join("02_bad.sql"), "INSERTT INTO t VALUES (2);").unwrap();

        let session = MemorySession::default().fail_on("INSERTT");
        let mut seeder = Seeder::new(session, dir.path());
        let err = seeder.run().await.unwrap_err();

        assert!(matches!(err, ShiftError::Migration { ref name, .. } if name == "02_bad.sql"));
        let session = seeder.into_session();
        assert_eq!(session.rollbacks, 1);
        assert_eq!(session.commits, 0);
    }

    #[tokio::test]
    async fn test_blank_seeds_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("01_empty.sql"), "-- nothing\n").unwrap();

        let mut seeder = Seeder::new(MemorySession::default(), dir.path());
        let report = seeder.run().await.unwrap();

        assert!(report.executed.is_empty());
        assert_eq!(report.skipped, vec!["01_empty.sql"]);
        assert_eq!(seeder.into_session().begins, 0);
    }

    #[tokio::test]
    async fn test_missing_seeds_dir_is_config_error() {
        let mut seeder = Seeder::new(MemorySession::default(), "/nonexistent/seeds");
        let err = seeder.run().await.unwrap_err();
        assert!(err.is_config());
    }
}
