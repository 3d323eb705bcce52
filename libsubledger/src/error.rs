//! Error types for Subledger

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SubledgerError>;

#[derive(Error, Debug)]
pub enum SubledgerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SubledgerError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SubledgerError::InvalidInput(_) => 3,
            SubledgerError::Feed(FeedError::Authentication(_)) => 2,
            SubledgerError::Feed(_) => 1,
            SubledgerError::Config(_) => 1,
            SubledgerError::Database(_) => 1,
        }
    }

    /// Whether the ingestion loop may recover from this error by
    /// re-subscribing after a backoff. Only feed-layer errors qualify;
    /// everything else surfaces to the process boundary.
    pub fn is_transient(&self) -> bool {
        matches!(self, SubledgerError::Feed(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read credential file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse credential file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors surfaced by a feed source during subscription or iteration.
///
/// The ingestion loop treats every variant as transient, mirroring the
/// blanket retry the archiver has always applied to feed-layer failures.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),
}
