//! Canonical event persistence
//!
//! Write-side functions take a connection so a pass can run them inside
//! its transaction (`&mut *tx`); read-side functions take the pool.

use chrono::NaiveDate;
use showlist_common::time::{format_iso_date, parse_iso_date};
use showlist_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::models::{CanonicalEvent, SourceProvenance};

const EVENT_COLUMNS: &str = "identity_key, name, event_date, venue_name, ticket_url, provenance, last_seen_at";

fn parse_stored_date(value: &str, column: &str, key: &str) -> Result<NaiveDate> {
    parse_iso_date(value).ok_or_else(|| Error::Internal(format!("Bad {} '{}' on event {}", column, value, key)))
}

fn event_from_row(row: &SqliteRow) -> Result<CanonicalEvent> {
    let identity_key: String = row.get("identity_key");
    let event_date: String = row.get("event_date");
    let last_seen_at: String = row.get("last_seen_at");
    let provenance: String = row.get("provenance");

    Ok(CanonicalEvent {
        event_date: parse_stored_date(&event_date, "event_date", &identity_key)?,
        last_seen_at: parse_stored_date(&last_seen_at, "last_seen_at", &identity_key)?,
        source_provenance: provenance.parse::<SourceProvenance>()?,
        display_name: row.get("name"),
        venue_name: row.get("venue_name"),
        ticket_url: row.get("ticket_url"),
        identity_key,
    })
}

/// Load every stored event, ordered by identity key
pub async fn load_all(conn: &mut SqliteConnection) -> Result<Vec<CanonicalEvent>> {
    let rows = sqlx::query(&format!("SELECT {} FROM events ORDER BY identity_key", EVENT_COLUMNS))
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(event_from_row).collect()
}

/// Insert or overwrite one event by identity key
pub async fn upsert(conn: &mut SqliteConnection, event: &CanonicalEvent) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO events (identity_key, name, event_date, venue_name, ticket_url, provenance, last_seen_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(identity_key) DO UPDATE SET
            name = excluded.name,
            event_date = excluded.event_date,
            venue_name = excluded.venue_name,
            ticket_url = excluded.ticket_url,
            provenance = excluded.provenance,
            last_seen_at = excluded.last_seen_at
        "#,
    )
    .bind(&event.identity_key)
    .bind(&event.display_name)
    .bind(format_iso_date(event.event_date))
    .bind(&event.venue_name)
    .bind(&event.ticket_url)
    .bind(event.source_provenance.as_str())
    .bind(format_iso_date(event.last_seen_at))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Delete events dated before `today`; returns rows removed
pub async fn sweep_expired(conn: &mut SqliteConnection, today: NaiveDate) -> Result<u64> {
    let result = sqlx::query("DELETE FROM events WHERE event_date < ?")
        .bind(format_iso_date(today))
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Events on or after `today`, by date then name
pub async fn list_upcoming(pool: &SqlitePool, today: NaiveDate) -> Result<Vec<CanonicalEvent>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM events WHERE event_date >= ? ORDER BY event_date, name COLLATE NOCASE, identity_key",
        EVENT_COLUMNS
    ))
    .bind(format_iso_date(today))
    .fetch_all(pool)
    .await?;

    rows.iter().map(event_from_row).collect()
}

/// Load one event by identity key
pub async fn get(pool: &SqlitePool, identity_key: &str) -> Result<Option<CanonicalEvent>> {
    let row = sqlx::query(&format!("SELECT {} FROM events WHERE identity_key = ?", EVENT_COLUMNS))
        .bind(identity_key)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(event_from_row).transpose()
}

/// Number of stored events
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Delete one event; false when no row had that key
pub async fn delete_event(pool: &SqlitePool, identity_key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM events WHERE identity_key = ?")
        .bind(identity_key)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every event; returns rows removed
pub async fn delete_all(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM events").execute(pool).await?;
    Ok(result.rows_affected())
}
