//! Database operations for Subledger

use sqlx::sqlite::SqlitePool;
use std::path::Path;

use crate::error::Result;

/// Append-only record sink backed by SQLite.
///
/// One table, `posts(timestamp, post)`, no uniqueness constraint. The
/// sink never deduplicates; a post emitted twice lands twice.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(db_path: &str) -> Result<Self> {
        // Expand path and create parent directories
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(crate::error::DbError::IoError)?;
        }

        // Use forward slashes for SQLite URL (works on both Windows and Unix)
        // Use mode=rwc to allow creating the database file if it doesn't exist
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(crate::error::DbError::MigrationError)?;

        Ok(Self { pool })
    }

    /// Append one normalized post. `post` is the record's JSON
    /// serialization; `timestamp` its integer creation time.
    pub async fn insert_post(&self, timestamp: i64, post: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (timestamp, post)
            VALUES (?, ?)
            "#,
        )
        .bind(timestamp)
        .bind(post)
        .execute(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(())
    }

    /// All rows in insertion order.
    pub async fn all_posts(&self) -> Result<Vec<(i64, String)>> {
        use sqlx::Row;

        let rows = sqlx::query(
            r#"
            SELECT timestamp, post FROM posts ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::DbError::SqlxError)?;

        Ok(rows
            .iter()
            .map(|r| (r.get("timestamp"), r.get("post")))
            .collect())
    }

    /// Number of archived rows.
    pub async fn count_posts(&self) -> Result<i64> {
        use sqlx::Row;

        let row = sqlx::query(r#"SELECT COUNT(*) AS n FROM posts"#)
            .fetch_one(&self.pool)
            .await
            .map_err(crate::error::DbError::SqlxError)?;

        Ok(row.get("n"))
    }
}
