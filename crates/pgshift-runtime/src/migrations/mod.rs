pub mod ledger;
mod reconciler;
mod session;
pub mod split;
mod status;
mod store;

pub use ledger::LedgerEntry;
pub use reconciler::{pending_migrations, ApplyReport, Reconciler, RevertReport};
pub use session::{execute_script, finish, MigrationSession, PgSession, ScriptSession};
pub use status::{StatusEntry, StatusReport};
pub use store::{MigrationStore, DOWN_FILE, UP_FILE};
