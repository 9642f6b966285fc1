//! Shared fixtures for showlist-sync integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use showlist_common::config::ManualEntryConfig;
use showlist_common::db::init_memory_database;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

use showlist_sync::config::SyncSettings;
use showlist_sync::db::events;
use showlist_sync::models::CanonicalEvent;
use showlist_sync::sources::{
    FetchError, HeuristicTextSource, ManualSource, PageFetcher, PageSourceSettings, SourceAdapter,
    StaticPageFetcher, StructuredDataSource, TicketingApiSettings, TicketingApiSource,
};

pub const EARL: &str = "The EARL";
pub const TICKETING_URL: &str = "https://api.example/discovery/v2/events.json";

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fresh in-memory database with the full schema
pub async fn test_pool() -> SqlitePool {
    init_memory_database().await.unwrap()
}

/// Default settings with a short adapter timeout
pub fn test_settings() -> SyncSettings {
    SyncSettings {
        adapter_timeout: Duration::from_secs(2),
        ..SyncSettings::default()
    }
}

pub fn manual_entry(date: &str, name: &str, venue: &str) -> ManualEntryConfig {
    ManualEntryConfig {
        date: date.to_string(),
        name: name.to_string(),
        venue: venue.to_string(),
        lineup: None,
        ticket_url: None,
    }
}

pub fn manual_source(entries: Vec<ManualEntryConfig>) -> SourceAdapter {
    SourceAdapter::Manual(ManualSource::new("manual", entries))
}

fn page_settings(name: &str, venue: &str) -> PageSourceSettings {
    PageSourceSettings {
        name: name.to_string(),
        venue: venue.to_string(),
        url: format!("https://{}.example/shows", name),
    }
}

/// Structured-data source serving `page`
pub fn structured_source(name: &str, venue: &str, page: &str) -> SourceAdapter {
    let settings = page_settings(name, venue);
    let fetcher = StaticPageFetcher::new().with_page(settings.url.clone(), page);
    SourceAdapter::StructuredData(StructuredDataSource::new(settings, Arc::new(fetcher)))
}

/// Heuristic text source serving `page`
pub fn heuristic_source(name: &str, venue: &str, page: &str) -> SourceAdapter {
    let settings = page_settings(name, venue);
    let fetcher = StaticPageFetcher::new().with_page(settings.url.clone(), page);
    SourceAdapter::HeuristicText(HeuristicTextSource::new(settings, Arc::new(fetcher)))
}

/// Page source whose fetches go through `fetcher`
pub fn structured_source_with(name: &str, venue: &str, fetcher: Arc<dyn PageFetcher>) -> SourceAdapter {
    SourceAdapter::StructuredData(StructuredDataSource::new(page_settings(name, venue), fetcher))
}

/// Ticketing API source answering with `body`
pub fn api_source(body: &str) -> SourceAdapter {
    let settings = TicketingApiSettings {
        name: "ticketmaster".to_string(),
        base_url: TICKETING_URL.to_string(),
        api_key: "test-key".to_string(),
        city: "Atlanta".to_string(),
        classification: "music".to_string(),
        page_size: 100,
    };
    let fetcher = StaticPageFetcher::new().with_page(TICKETING_URL, body);
    SourceAdapter::Api(TicketingApiSource::new(settings, Arc::new(fetcher)))
}

/// Page with one JSON-LD list of `(name, startDate)` events
pub fn ld_json_page(events: &[(&str, &str)]) -> String {
    let items: Vec<serde_json::Value> = events
        .iter()
        .map(|(name, date)| {
            serde_json::json!({
                "@type": "MusicEvent",
                "name": name,
                "startDate": date,
            })
        })
        .collect();

    format!(
        r#"<html><head><script type="application/ld+json">{}</script></head><body></body></html>"#,
        serde_json::Value::Array(items)
    )
}

/// Fetcher that always fails
pub struct FailingFetcher;

#[async_trait]
impl PageFetcher for FailingFetcher {
    async fn get_text(&self, _url: &str, _query: &[(&str, String)]) -> Result<String, FetchError> {
        Err(FetchError::Network("connection refused".to_string()))
    }
}

/// Fetcher that never answers in time
pub struct SlowFetcher;

#[async_trait]
impl PageFetcher for SlowFetcher {
    async fn get_text(&self, _url: &str, _query: &[(&str, String)]) -> Result<String, FetchError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(String::new())
    }
}

/// Every stored row, by identity key
pub async fn all_events(pool: &SqlitePool) -> Vec<CanonicalEvent> {
    let mut conn = pool.acquire().await.unwrap();
    events::load_all(&mut conn).await.unwrap()
}
