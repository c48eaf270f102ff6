use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use crate::domain::ScanStats;

/// Persisted process-wide scan counters: total scans, phishing hits and the
/// last scan instant. Incremented on every successful classification.
#[derive(Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn record_scan(&self, is_phish: bool) -> Result<ScanStats> {
        sqlx::query(
            r#"UPDATE scan_stats
               SET total_scans = total_scans + 1,
                   phish_detected = phish_detected + ?1,
                   last_scan = ?2
               WHERE id = 1"#,
        )
        .bind(i64::from(is_phish))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        self.snapshot().await
    }

    pub async fn snapshot(&self) -> Result<ScanStats> {
        let (total_scans, phish_detected, last_scan): (i64, i64, Option<DateTime<Utc>>) =
            sqlx::query_as(
                r#"SELECT total_scans, phish_detected, last_scan FROM scan_stats WHERE id = 1"#,
            )
            .fetch_one(&self.pool)
            .await?;
        Ok(ScanStats {
            total_scans,
            phish_detected,
            last_scan,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn setup() -> (StatsRepository, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let pool = db::init_pool(&dir.path().join("stats.db"))
            .await
            .expect("open db");
        (StatsRepository::new(pool), dir)
    }

    #[tokio::test]
    async fn counters_start_at_zero() {
        let (repo, _dir) = setup().await;
        let stats = repo.snapshot().await.unwrap();
        assert_eq!(stats.total_scans, 0);
        assert_eq!(stats.phish_detected, 0);
        assert!(stats.last_scan.is_none());
    }

    #[tokio::test]
    async fn every_scan_counts_but_only_phish_hits_accumulate() {
        let (repo, _dir) = setup().await;
        repo.record_scan(false).await.unwrap();
        repo.record_scan(true).await.unwrap();
        let stats = repo.record_scan(true).await.unwrap();
        assert_eq!(stats.total_scans, 3);
        assert_eq!(stats.phish_detected, 2);
        assert!(stats.last_scan.is_some());
    }

    #[tokio::test]
    async fn counters_survive_reopening() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stats.db");

        let pool = db::init_pool(&path).await.unwrap();
        let repo = StatsRepository::new(pool);
        repo.record_scan(true).await.unwrap();
        repo.close().await;

        let pool = db::init_pool(&path).await.unwrap();
        let repo = StatsRepository::new(pool);
        let stats = repo.snapshot().await.unwrap();
        assert_eq!(stats.total_scans, 1);
        assert_eq!(stats.phish_detected, 1);
    }
}
