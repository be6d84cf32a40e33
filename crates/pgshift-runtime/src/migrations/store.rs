use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pgshift_core::error::{Result, ShiftError};
use tracing::debug;

pub const UP_FILE: &str = "up.sql";
pub const DOWN_FILE: &str = "down.sql";

/// Read-only view of the migrations root.
#[derive(Debug, Clone)]
pub struct MigrationStore {
    root: PathBuf,
}

impl MigrationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Fail unless the root directory exists.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(ShiftError::Config(format!(
                "Migrations directory not found: {}\nRun `pgshift init` first.",
                self.root.display()
            )))
        }
    }

    /// Names of the immediate subdirectories, sorted ascending.
    ///
    /// Any directory name is accepted; regular files are ignored.
    pub fn list(&self) -> Result<Vec<String>> {
        self.ensure_exists()?;

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().into_string().map_err(|raw| {
                ShiftError::Config(format!("Migration directory name is not UTF-8: {:?}", raw))
            })?;
            names.push(name);
        }

        names.sort();
        debug!("Found {} migration directories", names.len());
        Ok(names)
    }

    pub fn read_up(&self, name: &str) -> Result<Option<String>> {
        read_optional(&self.root.join(name).join(UP_FILE))
    }

    pub fn read_down(&self, name: &str) -> Result<Option<String>> {
        read_optional(&self.root.join(name).join(DOWN_FILE))
    }

    pub fn has_down(&self, name: &str) -> bool {
        self.root.join(name).join(DOWN_FILE).is_file()
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ShiftError::Io(e)),
    }
}
