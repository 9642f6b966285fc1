//! Upcoming events listing
//!
//! The only read path downstream displays use: `GET /events` returns
//! today's and future events ordered by date.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use showlist_common::time::{format_iso_date, today};

use crate::db::events;
use crate::models::CanonicalEvent;
use crate::{ApiError, ApiResult, AppState};

/// Largest page a caller may ask for
const MAX_LIMIT: usize = 1000;

/// Query parameters for GET /events
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Maximum number of events returned
    pub limit: Option<usize>,
}

/// One listed event
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventItem {
    /// Identity key
    pub id: String,
    pub title: String,
    pub venue: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub ticket_url: Option<String>,
}

impl From<CanonicalEvent> for EventItem {
    fn from(event: CanonicalEvent) -> Self {
        Self {
            id: event.identity_key,
            title: event.display_name,
            venue: event.venue_name,
            date: format_iso_date(event.event_date),
            ticket_url: event.ticket_url,
        }
    }
}

/// GET /events
///
/// **Errors:**
/// - 400 Bad Request: `limit` is 0 or above 1000
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Json<Vec<EventItem>>> {
    let limit = match query.limit {
        Some(limit) if limit == 0 || limit > MAX_LIMIT => {
            return Err(ApiError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_LIMIT
            )));
        }
        Some(limit) => limit,
        None => MAX_LIMIT,
    };

    let upcoming = events::list_upcoming(&state.db, today()).await?;

    Ok(Json(
        upcoming.into_iter().take(limit).map(EventItem::from).collect(),
    ))
}

/// Build event listing routes
pub fn event_routes() -> Router<AppState> {
    Router::new().route("/events", get(list_events))
}
