mod database;
mod migrations;

pub use database::DatabaseConfig;
pub use migrations::{DumpConfig, MigrationsConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ShiftError};

/// Environment variables that may carry the connection string, in lookup order.
pub const DATABASE_URL_VARS: [&str; 2] = ["DATABASE_URL", "POSTGRES_URL"];

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "pgshift.toml";

/// Root configuration for pgshift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub migrations: MigrationsConfig,

    #[serde(default)]
    pub dump: DumpConfig,
}

impl ShiftConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ShiftError::Config(format!("Failed to read config file: {}", e)))?;

        Self::parse_toml(&content)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string, substituting `${VAR}` from the process environment.
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with(content, |name| std::env::var(name).ok())
    }

    /// Parse configuration with an explicit variable lookup.
    pub fn parse_toml_with<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = substitute_env_vars(content, lookup);

        toml::from_str(&content)
            .map_err(|e| ShiftError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Pick the connection string.
    ///
    /// Precedence is the explicit value, then [`DATABASE_URL_VARS`] in order,
    /// then `[database].url`. Empty values are skipped.
    pub fn resolve_database_url<F>(&self, explicit: Option<&str>, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = explicit.map(str::trim).filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }

        for var in DATABASE_URL_VARS {
            if let Some(url) = lookup(var).filter(|u| !u.trim().is_empty()) {
                return Ok(url.trim().to_string());
            }
        }

        if let Some(url) = self.database.configured_url() {
            return Ok(url.to_string());
        }

        Err(ShiftError::Config(format!(
            "No database connection string. Set {} or {}, or pass --database-url.",
            DATABASE_URL_VARS[0], DATABASE_URL_VARS[1]
        )))
    }

    /// Starter file written by `pgshift init`.
    pub fn template() -> &'static str {
        r#"[database]
url = "${DATABASE_URL}"
pool_size = 1
pool_timeout_secs = 30

[migrations]
dir = "migrations"
seeds_dir = "seeds"

[dump]
pg_dump = "pg_dump"
output = "schema.sql"
"#
    }
}

/// Replace `${VAR}` with the looked-up value. Unknown variables are left in place.
fn substitute_env_vars<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
        Ok(re) => re,
        Err(_) => return content.to_string(),
    };

    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}
