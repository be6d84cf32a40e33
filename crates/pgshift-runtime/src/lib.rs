pub mod db;
pub mod migrations;
pub mod schema;
pub mod seed;

#[cfg(test)]
pub(crate) mod testing;

pub use db::Database;
pub use migrations::{
    ApplyReport, LedgerEntry, MigrationSession, MigrationStore, PgSession, Reconciler,
    RevertReport, ScriptSession, StatusEntry, StatusReport,
};
pub use schema::{SchemaDumper, SchemaLoader};
pub use seed::{SeedReport, Seeder};
