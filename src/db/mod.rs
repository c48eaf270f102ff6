use std::{path::Path, str::FromStr, time::Duration};

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

pub mod stats;

/// Open (or create) the stats database and make sure the single counters row
/// exists. The row is created once at install time and never reset.
pub async fn init_pool(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scan_stats (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            total_scans INTEGER NOT NULL DEFAULT 0,
            phish_detected INTEGER NOT NULL DEFAULT 0,
            last_scan DATETIME
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(r#"INSERT OR IGNORE INTO scan_stats (id) VALUES (1)"#)
        .execute(&pool)
        .await?;

    Ok(pool)
}
