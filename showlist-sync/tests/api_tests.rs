//! Read-only HTTP API tests

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use helpers::*;
use showlist_sync::db::events;
use showlist_sync::models::{CanonicalEvent, SourceProvenance};
use showlist_sync::{build_router, AppState};

async fn seeded_state() -> AppState {
    let pool = test_pool().await;
    {
        let mut conn = pool.acquire().await.unwrap();
        let rows = [
            ("earl|2099-01-23|highonfire", "High On Fire", ymd(2099, 1, 23), Some("https://tix.example/hof")),
            ("ticketmaster:G5vYZ", "ENMY", ymd(2099, 1, 20), None),
            ("earl|2000-01-01|oldshow", "Old Show", ymd(2000, 1, 1), None),
        ];
        for (key, name, date, url) in rows {
            events::upsert(
                &mut conn,
                &CanonicalEvent {
                    identity_key: key.to_string(),
                    display_name: name.to_string(),
                    event_date: date,
                    venue_name: EARL.to_string(),
                    ticket_url: url.map(str::to_string),
                    source_provenance: SourceProvenance::ScrapedStructured,
                    last_seen_at: ymd(2026, 1, 10),
                },
            )
            .await
            .unwrap();
        }
    }
    AppState::new(pool)
}

async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
    let response = build_router(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_events_lists_upcoming_in_date_order() {
    let (status, json) = get_json(seeded_state().await, "/events").await;

    assert_eq!(status, StatusCode::OK);
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["id"], "ticketmaster:G5vYZ");
    assert_eq!(items[0]["title"], "ENMY");
    assert_eq!(items[0]["date"], "2099-01-20");
    assert!(items[0]["ticketUrl"].is_null());

    assert_eq!(items[1]["title"], "High On Fire");
    assert_eq!(items[1]["venue"], "The EARL");
    assert_eq!(items[1]["ticketUrl"], "https://tix.example/hof");
}

#[tokio::test]
async fn test_events_limit() {
    let (status, json) = get_json(seeded_state().await, "/events?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, json) = get_json(seeded_state().await, "/events?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_health() {
    let (status, json) = get_json(AppState::new(test_pool().await), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "showlist-sync");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["time"].is_string());
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let response = build_router(AppState::new(test_pool().await))
        .oneshot(
            Request::builder()
                .uri("/events")
                .header(header::ORIGIN, "https://listings.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}
