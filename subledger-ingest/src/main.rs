//! subledger-ingest - archive a subreddit's new posts as they arrive
//!
//! Long-running daemon that subscribes to a subreddit's new-post feed
//! and appends each post to a SQLite archive, retrying on transient
//! feed failures.

use clap::Parser;
use libsubledger::feed::reddit::RedditFeed;
use libsubledger::{Credentials, Database, IngestLoop, Outcome, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info, warn};

const USER_AGENT: &str = concat!("subledger-ingest/", env!("CARGO_PKG_VERSION"));

#[derive(Parser, Debug)]
#[command(name = "subledger-ingest")]
#[command(version)]
#[command(about = "Archive a subreddit's new posts as they arrive")]
#[command(long_about = "\
subledger-ingest - archive a subreddit's new posts as they arrive

DESCRIPTION:
    subledger-ingest is a long-running daemon that subscribes to a
    subreddit's new-post feed and appends each post to a SQLite archive
    as a (timestamp, json) row.

    Transient feed failures are retried with a fixed backoff. After
    three consecutive failures the daemon gives up and must be
    restarted externally. Posts published while the feed is down are
    not recovered.

USAGE:
    subledger-ingest credentials.json posts.db
    subledger-ingest --subreddit borrow credentials.json posts.db

SIGNALS:
    SIGTERM, SIGINT - Clean shutdown between posts

EXIT CODES:
    0 - Clean shutdown (also after retries are exhausted)
    1 - Runtime error
    2 - Feed authentication error
    3 - Invalid input
")]
struct Cli {
    /// Path to JSON credential file ({"client_id": ..., "client_secret": ...})
    credentials: PathBuf,

    /// Path to the SQLite database for storing posts
    database: PathBuf,

    /// Subreddit to archive
    #[arg(long, default_value = "borrow")]
    subreddit: String,

    /// Backoff between retries, in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 300)]
    backoff: u64,

    /// Consecutive feed failures tolerated before giving up
    #[arg(long, default_value_t = 3)]
    max_retries: u32,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        libsubledger::logging::LoggingConfig::new(
            libsubledger::logging::LogFormat::Text,
            "debug".to_string(),
            true,
        )
        .init();
    } else {
        libsubledger::logging::init_default();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let credentials = Credentials::load_from_path(&cli.credentials)?;
    let db = Database::new(&cli.database.to_string_lossy()).await?;

    let shutdown = Arc::new(AtomicBool::new(false));
    setup_signal_handlers(shutdown.clone())?;

    info!(subreddit = %cli.subreddit, "subledger-ingest starting");

    let feed = RedditFeed::new(credentials, USER_AGENT);
    let mut ingest = IngestLoop::new(Box::new(feed), db, cli.subreddit.as_str(), shutdown)
        .with_backoff(Duration::from_secs(cli.backoff))
        .with_max_retries(cli.max_retries);

    match ingest.run().await? {
        Outcome::Cancelled => info!("subledger-ingest stopped"),
        // Same exit status as a clean shutdown; only this log line
        // tells the aborted state apart.
        Outcome::RetriesExhausted => warn!("subledger-ingest aborted after repeated feed failures"),
    }

    Ok(())
}

/// Set up signal handlers for clean shutdown
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).map_err(|e| {
        libsubledger::SubledgerError::InvalidInput(format!("Signal setup failed: {}", e))
    })?;

    std::thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGTERM | SIGINT => {
                    info!("Received shutdown signal, stopping after the current post...");
                    shutdown.store(true, Ordering::Relaxed);
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(())
}
