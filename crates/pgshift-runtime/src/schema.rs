//! Schema dump through `pg_dump` and schema load as a trusted script.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use pgshift_core::error::{Result, ShiftError};

use crate::migrations::{execute_script, finish, ScriptSession};

/// Writes the schema of a database to a file using `pg_dump`.
pub struct SchemaDumper {
    program: String,
}

impl SchemaDumper {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(url: &str) -> [&str; 4] {
        ["--schema-only", "--no-owner", "--no-privileges", url]
    }

    /// Dump the schema only, returning the number of bytes written.
    pub async fn dump(&self, url: &str, output: &Path) -> Result<usize> {
        debug!("Running {} --schema-only", self.program);
        let out = Command::new(&self.program)
            .args(Self::args(url))
            .output()
            .await
            .map_err(|e| {
                ShiftError::ExternalTool(format!("Failed to run {}: {}", self.program, e))
            })?;

        if !out.status.success() {
            return Err(ShiftError::ExternalTool(format!(
                "{} exited with {}: {}",
                self.program,
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        tokio::fs::write(output, &out.stdout).await?;
        info!("Schema written to {}", output.display());
        Ok(out.stdout.len())
    }
}

/// Executes a schema file inside one transaction.
pub struct SchemaLoader<S> {
    session: S,
}

impl<S: ScriptSession> SchemaLoader<S> {
    pub fn new(session: S) -> Self {
        Self { session }
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Returns the number of statements executed.
    pub async fn load(&mut self, input: &Path) -> Result<usize> {
        let sql = read_schema(input)?;
        let label = input.display().to_string();

        self.session.begin().await?;
        let outcome = execute_script(&mut self.session, &label, &sql).await;
        let statements = finish(&mut self.session, outcome).await?;

        info!("Loaded {} statement(s) from {}", statements, label);
        Ok(statements)
    }
}

fn read_schema(input: &Path) -> Result<String> {
    if !input.is_file() {
        return Err(ShiftError::Config(format!(
            "Schema file not found: {}",
            input.display()
        )));
    }
    Ok(strip_meta_commands(&std::fs::read_to_string(input)?))
}

/// Drop psql meta-command lines such as `\restrict`, which `pg_dump` emits
/// but the server does not understand.
fn strip_meta_commands(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    for line in sql.lines() {
        if line.trim_start().starts_with('\\') {
            debug!("Ignoring psql meta-command: {}", line.trim());
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Default dump target when none is given on the command line.
pub fn resolve_path(explicit: Option<PathBuf>, configured: &Path) -> PathBuf {
    explicit.unwrap_or_else(|| configured.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemorySession;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_runs_in_transaction() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.sql");
        std::fs::write(
            &path,
            "CREATE TABLE a (id INT);\nCREATE INDEX a_id ON a (id);\n",
        )
        .unwrap();

        let mut loader = SchemaLoader::new(MemorySession::default());
        assert_eq!(loader.load(&path).await.unwrap(), 2);

        let session = loader.into_session();
        assert_eq!(session.begins, 1);
        assert_eq!(session.commits, 1);
    }

    #[tokio::test]
    async fn test_load_failure_rolls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.sql");
        std::fs::write(&path, "CREATE TABLE a (id INT);\nCREATE TABLEE b ();\n").unwrap();

        let mut loader = SchemaLoader::new(MemorySession::default().fail_on("TABLEE"));
        let err = loader.load(&path).await.unwrap_err();

        assert!(matches!(err, ShiftError::Migration { .. }));
        assert_eq!(loader.into_session().rollbacks, 1);
    }

    #[tokio::test]
    async fn test_load_skips_psql_meta_commands() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.sql");
        std::fs::write(
            &path,
            "\\restrict abc123\n\nSET statement_timeout = 0;\nCREATE TABLE a (id INT);\n\n\\unrestrict abc123\n",
        )
        .unwrap();

        let mut loader = SchemaLoader::new(MemorySession::default());
        assert_eq!(loader.load(&path).await.unwrap(), 2);

        let session = loader.into_session();
        assert_eq!(
            session.executed,
            vec!["SET statement_timeout = 0", "CREATE TABLE a (id INT)"]
        );
    }

    #[test]
    fn test_strip_meta_commands_keeps_sql() {
        let sql = "SELECT 1;\n  \\connect other\nSELECT 2;\n";
        assert_eq!(strip_meta_commands(sql), "SELECT 1;\nSELECT 2;\n");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let mut loader = SchemaLoader::new(MemorySession::default());
        let err = loader.load(Path::new("/nonexistent/schema.sql")).await.unwrap_err();
        assert!(err.is_config());
        assert_eq!(loader.into_session().begins, 0);
    }

    #[tokio::test]
    async fn test_dump_missing_binary() {
        let dir = TempDir::new().unwrap();
        let dumper = SchemaDumper::new("pgshift-no-such-pg-dump");
        let err = dumper
            .dump("postgres://localhost/db", &dir.path().join("out.sql"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShiftError::ExternalTool(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dump_writes_stdout() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.sql");
        let dumper = SchemaDumper::new("echo");

        let written = dumper.dump("postgres://localhost/db", &output).await.unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written, content.len());
        assert!(content.contains("--schema-only"));
        assert!(content.contains("postgres://localhost/db"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dump_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("out.sql");
        let err = SchemaDumper::new("false")
            .dump("postgres://localhost/db", &output)
            .await
            .unwrap_err();
        assert!(matches!(err, ShiftError::ExternalTool(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_resolve_path() {
        let configured = Path::new("schema.sql");
        assert_eq!(resolve_path(None, configured), PathBuf::from("schema.sql"));
        assert_eq!(
            resolve_path(Some(PathBuf::from("db/dump.sql")), configured),
            PathBuf::from("db/dump.sql")
        );
    }
}
