pub mod config;
pub mod error;

pub use config::{DatabaseConfig, DumpConfig, MigrationsConfig, ShiftConfig};
pub use error::{Result, ShiftError};
