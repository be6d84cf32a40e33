use std::path::PathBuf;

use anyhow::Result;
use pgshift_core::config::ShiftConfig;
use pgshift_runtime::{Database, MigrationStore};
use tracing::debug;

use super::GlobalArgs;

/// Configuration resolved once per invocation.
pub struct Context {
    pub config: ShiftConfig,
    pub config_path: PathBuf,
    pub migrations_dir: PathBuf,
    database_url: Option<String>,
}

impl Context {
    /// Read the config file if present and apply command-line overrides.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let config = ShiftConfig::load_or_default(&args.config)?;
        let migrations_dir = args
            .migrations_dir
            .clone()
            .unwrap_or_else(|| config.migrations.dir.clone());

        Ok(Self {
            config,
            config_path: args.config.clone(),
            migrations_dir,
            database_url: args.database_url.clone(),
        })
    }

    pub fn store(&self) -> MigrationStore {
        MigrationStore::new(&self.migrations_dir)
    }

    /// The connection string, taken from the flag, the environment, or the config file.
    pub fn database_url(&self) -> Result<String> {
        let url = self
            .config
            .resolve_database_url(self.database_url.as_deref(), |var| std::env::var(var).ok())?;
        Ok(url)
    }

    /// Open the pool for this command. Callers close it on every exit path.
    pub async fn connect(&self) -> Result<Database> {
        let url = self.database_url()?;
        debug!("Connecting to database");
        Ok(Database::connect(&url, &self.config.database).await?)
    }
}
