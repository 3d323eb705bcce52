//! Subledger - append-only archiver for a subreddit's new-post feed
//!
//! This library provides the core of a small ingestion daemon: a feed
//! abstraction with a polling Reddit implementation, a SQLite record
//! sink, and the retry/backoff loop that ties them together.

pub mod credentials;
pub mod db;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use credentials::Credentials;
pub use db::Database;
pub use error::{FeedError, Result, SubledgerError};
pub use ingest::{IngestLoop, Outcome};
pub use types::{PostRecord, RawPost};
