//! The `migrations` table recording which migrations have been applied.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS migrations (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

pub const SELECT_APPLIED: &str = "SELECT name, applied_at FROM migrations ORDER BY name ASC";

/// Ties on `applied_at` go to the greatest name.
pub const SELECT_LATEST: &str =
    "SELECT name, applied_at FROM migrations ORDER BY applied_at DESC, name DESC LIMIT 1";

pub const INSERT: &str = "INSERT INTO migrations (name) VALUES ($1)";

pub const DELETE: &str = "DELETE FROM migrations WHERE name = $1";

/// One applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(name: impl Into<String>, applied_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            applied_at,
        }
    }
}

/// The entry a revert targets: latest `applied_at`, then greatest name.
pub fn latest(entries: &[LedgerEntry]) -> Option<&LedgerEntry> {
    entries
        .iter()
        .max_by(|a, b| a.applied_at.cmp(&b.applied_at).then_with(|| a.name.cmp(&b.name)))
}
