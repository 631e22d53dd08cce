//! Metadata store trait and SQLite implementation.

use crate::clock::{Clock, SystemClock};
use crate::error::{MetadataError, MetadataResult};
use crate::models::SubmissionRow;
use crate::repos::submissions::{ListQuery, LockOutcome, ReplaceFn, SubmissionRepo};
use async_trait::async_trait;
use courier_core::SubmissionStatus;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: SubmissionRepo + Send + Sync {
    /// Create the schema if it does not exist yet.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// One logical collection; uniqueness and worker selection are carried by
/// the indexes. The callback-queue index is partial: only rows awaiting a
/// client callback are in it.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS submissions (
    owner TEXT NOT NULL,
    id TEXT NOT NULL,
    sdes_correlation_id TEXT NOT NULL,
    callback_url TEXT NOT NULL,
    status TEXT NOT NULL,
    object_location TEXT NOT NULL,
    object_content_length INTEGER NOT NULL,
    object_content_md5 TEXT NOT NULL,
    object_last_modified TEXT NOT NULL,
    failure_reason TEXT,
    failure_count INTEGER NOT NULL DEFAULT 0,
    locked_at TEXT,
    created_at TEXT NOT NULL,
    last_updated TEXT NOT NULL,
    PRIMARY KEY (owner, id)
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_submissions_correlation_id
    ON submissions (sdes_correlation_id);

CREATE INDEX IF NOT EXISTS idx_submissions_status_updated
    ON submissions (status, last_updated);

CREATE INDEX IF NOT EXISTS idx_submissions_callback_queue
    ON submissions (status, failure_count)
    WHERE status = 'Processed' OR status = 'Failed';
"#;

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    clock: Arc<dyn Clock>,
    lock_ttl: Duration,
}

impl SqliteStore {
    /// Create a new SQLite store using the wall clock.
    pub async fn new(path: impl AsRef<Path>, lock_ttl: Duration) -> MetadataResult<Self> {
        Self::with_clock(path, lock_ttl, Arc::new(SystemClock)).await
    }

    /// Create a new SQLite store with an injected clock.
    pub async fn with_clock(
        path: impl AsRef<Path>,
        lock_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures under worker
            // and handler concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            clock,
            lock_ttl,
        };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    fn now(&self) -> time::OffsetDateTime {
        self.clock.now()
    }

    /// Oldest lease timestamp still considered live.
    fn lock_cutoff(&self, now: time::OffsetDateTime) -> time::OffsetDateTime {
        now - self.lock_ttl
    }

    /// Shared transition logic for both update key shapes. Runs inside the
    /// caller's transaction so a racing worker cannot slip a transition in
    /// between the check and the commit.
    async fn finish_update(
        &self,
        mut tx: sqlx::Transaction<'_, Sqlite>,
        existing: Option<SubmissionRow>,
        key_desc: String,
        status: SubmissionStatus,
        failure_reason: Option<String>,
    ) -> MetadataResult<SubmissionRow> {
        let Some(mut row) = existing else {
            return Err(MetadataError::NotFound(format!(
                "nothing to update: {key_desc}"
            )));
        };

        let current = row
            .status()
            .map_err(|e| MetadataError::Internal(format!("corrupt status column: {e}")))?;
        if !current.can_transition_to(status) {
            return Err(MetadataError::InvalidStateTransition {
                from: current.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }

        let now = self.now();
        sqlx::query(
            "UPDATE submissions SET status = ?, failure_reason = ?, last_updated = ? \
             WHERE owner = ? AND id = ?",
        )
        .bind(status.as_str())
        .bind(&failure_reason)
        .bind(now)
        .bind(&row.owner)
        .bind(&row.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        row.status = status.as_str().to_string();
        row.failure_reason = failure_reason;
        row.last_updated = now;
        Ok(row)
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SubmissionRepo for SqliteStore {
    async fn insert(&self, row: &SubmissionRow) -> MetadataResult<()> {
        // Pre-check both unique keys for precise errors; the indexes still
        // enforce uniqueness under races.
        if self.get(&row.owner, &row.id).await?.is_some() {
            return Err(MetadataError::AlreadyExists(format!(
                "submission ({}, {}) already exists",
                row.owner, row.id
            )));
        }
        if self
            .get_by_correlation_id(&row.sdes_correlation_id)
            .await?
            .is_some()
        {
            return Err(MetadataError::AlreadyExists(format!(
                "correlation id {} already exists",
                row.sdes_correlation_id
            )));
        }

        let now = self.now();
        let result = sqlx::query(
            r#"
            INSERT INTO submissions (
                owner, id, sdes_correlation_id, callback_url, status,
                object_location, object_content_length, object_content_md5,
                object_last_modified, failure_reason, failure_count,
                locked_at, created_at, last_updated
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&row.owner)
        .bind(&row.id)
        .bind(&row.sdes_correlation_id)
        .bind(&row.callback_url)
        .bind(&row.status)
        .bind(&row.object_location)
        .bind(row.object_content_length)
        .bind(&row.object_content_md5)
        .bind(row.object_last_modified)
        .bind(&row.failure_reason)
        .bind(row.failure_count)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE constraint") => {
                Err(MetadataError::AlreadyExists(format!(
                    "submission ({}, {}) already exists",
                    row.owner, row.id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, owner: &str, id: &str) -> MetadataResult<Option<SubmissionRow>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            "SELECT * FROM submissions WHERE owner = ? AND id = ?",
        )
        .bind(owner)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> MetadataResult<Option<SubmissionRow>> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            "SELECT * FROM submissions WHERE sdes_correlation_id = ?",
        )
        .bind(correlation_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self, query: &ListQuery) -> MetadataResult<Vec<SubmissionRow>> {
        let status = query.status.map(|s| s.as_str());
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT * FROM submissions
            WHERE (?1 IS NULL OR owner = ?1)
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR created_at < ?3)
            ORDER BY created_at DESC
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(&query.owner)
        .bind(status)
        .bind(query.created_before)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update(
        &self,
        owner: &str,
        id: &str,
        status: SubmissionStatus,
        failure_reason: Option<String>,
    ) -> MetadataResult<SubmissionRow> {
        let mut tx = self.pool.begin().await?;
        let existing = sqlx::query_as::<_, SubmissionRow>(
            "SELECT * FROM submissions WHERE owner = ? AND id = ?",
        )
        .bind(owner)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        self.finish_update(tx, existing, format!("({owner}, {id})"), status, failure_reason)
            .await
    }

    async fn update_by_correlation_id(
        &self,
        correlation_id: &str,
        status: SubmissionStatus,
        failure_reason: Option<String>,
    ) -> MetadataResult<SubmissionRow> {
        let mut tx = self.pool.begin().await?;
        let existing = sqlx::query_as::<_, SubmissionRow>(
            "SELECT * FROM submissions WHERE sdes_correlation_id = ?",
        )
        .bind(correlation_id)
        .fetch_optional(&mut *tx)
        .await?;

        self.finish_update(
            tx,
            existing,
            format!("correlation id {correlation_id}"),
            status,
            failure_reason,
        )
        .await
    }

    async fn remove(&self, owner: &str, id: &str) -> MetadataResult<()> {
        sqlx::query("DELETE FROM submissions WHERE owner = ? AND id = ?")
            .bind(owner)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn lock_and_replace_oldest_by_status(
        &self,
        status: SubmissionStatus,
        f: ReplaceFn,
    ) -> MetadataResult<LockOutcome> {
        let now = self.now();
        let cutoff = self.lock_cutoff(now);

        let candidate = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT * FROM submissions
            WHERE status = ? AND (locked_at IS NULL OR locked_at <= ?)
            ORDER BY last_updated ASC
            LIMIT 1
            "#,
        )
        .bind(status.as_str())
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut item) = candidate else {
            return Ok(LockOutcome::NotFound);
        };

        // Take the lease with a compare-and-swap that re-checks last_updated
        // and the lock window, so a racing worker cannot double-lease.
        let leased = sqlx::query(
            r#"
            UPDATE submissions SET locked_at = ?
            WHERE owner = ? AND id = ? AND last_updated = ?
              AND (locked_at IS NULL OR locked_at <= ?)
            "#,
        )
        .bind(now)
        .bind(&item.owner)
        .bind(&item.id)
        .bind(item.last_updated)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        if leased.rows_affected() == 0 {
            // Lost the race; the winner holds the lease.
            return Ok(LockOutcome::NotFound);
        }

        item.locked_at = Some(now);
        let owner = item.owner.clone();
        let id = item.id.clone();

        match f(item).await {
            Ok(replacement) => {
                let committed = self.now();
                sqlx::query(
                    r#"
                    UPDATE submissions SET
                        sdes_correlation_id = ?,
                        callback_url = ?,
                        status = ?,
                        object_location = ?,
                        object_content_length = ?,
                        object_content_md5 = ?,
                        object_last_modified = ?,
                        failure_reason = ?,
                        failure_count = ?,
                        locked_at = NULL,
                        last_updated = ?
                    WHERE owner = ? AND id = ?
                    "#,
                )
                .bind(&replacement.sdes_correlation_id)
                .bind(&replacement.callback_url)
                .bind(&replacement.status)
                .bind(&replacement.object_location)
                .bind(replacement.object_content_length)
                .bind(&replacement.object_content_md5)
                .bind(replacement.object_last_modified)
                .bind(&replacement.failure_reason)
                .bind(replacement.failure_count)
                .bind(committed)
                .bind(&owner)
                .bind(&id)
                .execute(&self.pool)
                .await?;

                Ok(LockOutcome::Found)
            }
            Err(e) => {
                // Release the lease; the row itself stays untouched.
                if let Err(release_err) =
                    sqlx::query("UPDATE submissions SET locked_at = NULL WHERE owner = ? AND id = ?")
                        .bind(&owner)
                        .bind(&id)
                        .execute(&self.pool)
                        .await
                {
                    tracing::error!(
                        owner = %owner,
                        id = %id,
                        error = %release_err,
                        "failed to release lease after replace failure; lock TTL will recover it"
                    );
                }
                Err(MetadataError::Replace(e))
            }
        }
    }

    async fn mark_callback_failed(&self, max_failures: i64) -> MetadataResult<u64> {
        let now = self.now();
        let cutoff = self.lock_cutoff(now);
        let result = sqlx::query(
            r#"
            UPDATE submissions SET status = ?, locked_at = NULL, last_updated = ?
            WHERE status IN (?, ?)
              AND failure_count >= ?
              AND (locked_at IS NULL OR locked_at <= ?)
            "#,
        )
        .bind(SubmissionStatus::CallbackFailed.as_str())
        .bind(now)
        .bind(SubmissionStatus::Processed.as_str())
        .bind(SubmissionStatus::Failed.as_str())
        .bind(max_failures)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
