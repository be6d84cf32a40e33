use thiserror::Error;

/// Core error type for pgshift operations.
#[derive(Error, Debug)]
pub enum ShiftError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    /// A trusted script failed. The enclosing transaction has been rolled back.
    #[error("Migration '{name}' failed: {message}")]
    Migration { name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("External tool error: {0}")]
    ExternalTool(String),
}

impl ShiftError {
    pub fn migration(name: impl Into<String>, message: impl Into<String>) -> Self {
        ShiftError::Migration {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Whether the error was raised before any transaction could be opened.
    pub fn is_config(&self) -> bool {
        matches!(self, ShiftError::Config(_) | ShiftError::InvalidArgument(_))
    }
}

/// Result type alias using ShiftError.
pub type Result<T> = std::result::Result<T, ShiftError>;
