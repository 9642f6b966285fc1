//! Run-level lock
//!
//! One row in `sync_lock` marks a pass in progress. Acquisition is a single
//! conditional upsert, so two processes racing for the lock cannot both
//! win. A lock older than the stale threshold belongs to a pass that died
//! without releasing it and may be taken over.

use chrono::{DateTime, Utc};
use showlist_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::time::Duration;

use super::runs::{format_timestamp, parse_timestamp};

/// Result of a lock attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockAttempt {
    Acquired,
    /// Another live pass holds the lock
    Held { holder: String, acquired_at: DateTime<Utc> },
}

/// Current lock holder, if any
pub async fn current_holder(pool: &SqlitePool) -> Result<Option<(String, DateTime<Utc>)>> {
    let row = sqlx::query("SELECT holder, acquired_at FROM sync_lock WHERE id = 1")
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let holder: String = row.get("holder");
            let acquired_at: String = row.get("acquired_at");
            Ok(Some((holder, parse_timestamp(&acquired_at)?)))
        }
        None => Ok(None),
    }
}

/// Try to take the run lock for `holder`
pub async fn try_acquire(pool: &SqlitePool, holder: &str, stale_after: Duration) -> Result<LockAttempt> {
    let stale_after = chrono::Duration::from_std(stale_after)
        .map_err(|e| Error::InvalidInput(format!("Lock stale threshold out of range: {}", e)))?;
    let now = Utc::now();
    let stale_before = now - stale_after;

    let previous = current_holder(pool).await?;

    let result = sqlx::query(
        r#"
        INSERT INTO sync_lock (id, holder, acquired_at)
        VALUES (1, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            holder = excluded.holder,
            acquired_at = excluded.acquired_at
        WHERE sync_lock.acquired_at < ?
        "#,
    )
    .bind(holder)
    .bind(format_timestamp(now))
    .bind(format_timestamp(stale_before))
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        if let Some((stale_holder, since)) = previous {
            tracing::warn!(
                holder = %stale_holder,
                since = %since,
                "Took over stale run lock"
            );
        }
        return Ok(LockAttempt::Acquired);
    }

    match current_holder(pool).await? {
        Some((holder, acquired_at)) => Ok(LockAttempt::Held { holder, acquired_at }),
        None => Err(Error::Internal("Run lock vanished while acquiring".to_string())),
    }
}

/// Release the lock if `holder` still owns it
pub async fn release(pool: &SqlitePool, holder: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sync_lock WHERE id = 1 AND holder = ?")
        .bind(holder)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
