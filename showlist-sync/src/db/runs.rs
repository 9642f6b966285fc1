//! Sync run log

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use showlist_common::{Error, Result};
use sqlx::{Row, SqlitePool};
use std::fmt;
use uuid::Uuid;

use crate::models::SyncSummary;

/// Final state of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "succeeded" => Ok(RunStatus::Succeeded),
            "failed" => Ok(RunStatus::Failed),
            other => Err(Error::Internal(format!("Unknown run status: {}", other))),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One logged pass
#[derive(Debug, Clone, Serialize)]
pub struct SyncRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub summary: Option<SyncSummary>,
    pub error: Option<String>,
}

/// Fixed-width UTC timestamps so stored text sorts chronologically
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Bad run timestamp '{}': {}", value, e)))
}

/// Append a run to the log
pub async fn record_run(pool: &SqlitePool, run: &SyncRun) -> Result<()> {
    let summary = run
        .summary
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| Error::Internal(format!("Serialize run summary failed: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO sync_runs (run_id, started_at, finished_at, status, summary, error)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(run.run_id.to_string())
    .bind(format_timestamp(run.started_at))
    .bind(format_timestamp(run.finished_at))
    .bind(run.status.as_str())
    .bind(summary)
    .bind(&run.error)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent runs first
pub async fn recent_runs(pool: &SqlitePool, limit: i64) -> Result<Vec<SyncRun>> {
    let rows = sqlx::query(
        r#"
        SELECT run_id, started_at, finished_at, status, summary, error
        FROM sync_runs
        ORDER BY started_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let run_id: String = row.get("run_id");
            let started_at: String = row.get("started_at");
            let finished_at: String = row.get("finished_at");
            let status: String = row.get("status");
            let summary: Option<String> = row.get("summary");

            let summary = summary
                .map(|s| serde_json::from_str::<SyncSummary>(&s))
                .transpose()
                .map_err(|e| Error::Internal(format!("Bad run summary for {}: {}", run_id, e)))?;

            Ok(SyncRun {
                run_id: Uuid::parse_str(&run_id)
                    .map_err(|e| Error::Internal(format!("Bad run id '{}': {}", run_id, e)))?,
                started_at: parse_timestamp(&started_at)?,
                finished_at: parse_timestamp(&finished_at)?,
                status: RunStatus::parse(&status)?,
                summary,
                error: row.get("error"),
            })
        })
        .collect()
}
