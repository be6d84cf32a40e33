use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where migrations and seeds live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsConfig {
    /// Root holding one directory per migration.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Directory of `*.sql` seed scripts.
    #[serde(default = "default_seeds_dir")]
    pub seeds_dir: PathBuf,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            seeds_dir: default_seeds_dir(),
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_seeds_dir() -> PathBuf {
    PathBuf::from("seeds")
}

/// Schema dump settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// `pg_dump` binary to invoke.
    #[serde(default = "default_pg_dump")]
    pub pg_dump: String,

    /// Default file for `dump` and `load`.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            pg_dump: default_pg_dump(),
            output: default_output(),
        }
    }
}

fn default_pg_dump() -> String {
    "pg_dump".to_string()
}

fn default_output() -> PathBuf {
    PathBuf::from("schema.sql")
}
