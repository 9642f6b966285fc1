//! Ticketing discovery API adapter
//!
//! One GET against the discovery endpoint; events come back under
//! `_embedded.events`, each with a stable id the identity key can reuse.

use serde::Deserialize;
use std::sync::Arc;

use super::fetcher::PageFetcher;
use crate::error::{SyncError, SyncResult};
use crate::models::RawCandidate;

/// Ticketing API source settings
#[derive(Debug, Clone)]
pub struct TicketingApiSettings {
    /// Source tag, prefixes native identity keys
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub city: String,
    pub classification: String,
    pub page_size: u32,
}

/// Discovery API response (only the fields the pipeline reads)
#[derive(Debug, Deserialize)]
struct DiscoveryResponse {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedEvents>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedEvents {
    #[serde(default)]
    events: Vec<DiscoveryEvent>,
}

#[derive(Debug, Deserialize)]
struct DiscoveryEvent {
    id: Option<String>,
    name: Option<String>,
    url: Option<String>,
    dates: Option<EventDates>,
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedVenues>,
}

#[derive(Debug, Deserialize)]
struct EventDates {
    start: Option<EventStart>,
}

#[derive(Debug, Deserialize)]
struct EventStart {
    #[serde(rename = "localDate")]
    local_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedVenues {
    #[serde(default)]
    venues: Vec<DiscoveryVenue>,
}

#[derive(Debug, Deserialize)]
struct DiscoveryVenue {
    name: Option<String>,
}

/// Ticketing discovery API adapter
pub struct TicketingApiSource {
    settings: TicketingApiSettings,
    fetcher: Arc<dyn PageFetcher>,
}

impl TicketingApiSource {
    pub fn new(settings: TicketingApiSettings, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { settings, fetcher }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Query the discovery endpoint for the configured city
    pub async fn fetch(&self) -> SyncResult<Vec<RawCandidate>> {
        let query = [
            ("apikey", self.settings.api_key.clone()),
            ("city", self.settings.city.clone()),
            ("classificationName", self.settings.classification.clone()),
            ("size", self.settings.page_size.to_string()),
        ];

        let body = self
            .fetcher
            .get_text(&self.settings.base_url, &query)
            .await
            .map_err(|e| SyncError::source_unavailable(&self.settings.name, e))?;

        let candidates = parse_discovery_response(&body)
            .map_err(|e| SyncError::source_unavailable(&self.settings.name, format!("parse error: {}", e)))?;

        tracing::info!(
            source = %self.settings.name,
            city = %self.settings.city,
            count = candidates.len(),
            "Fetched ticketing API events"
        );

        Ok(candidates)
    }
}

/// Extract candidates from a discovery API JSON body
///
/// Events missing an id, name or local date are skipped; a response with no
/// `_embedded` block (zero results) yields an empty list.
pub fn parse_discovery_response(body: &str) -> Result<Vec<RawCandidate>, serde_json::Error> {
    let response: DiscoveryResponse = serde_json::from_str(body)?;

    let events = response.embedded.map(|e| e.events).unwrap_or_default();

    let candidates = events
        .into_iter()
        .filter_map(|event| {
            let local_date = event.dates.and_then(|d| d.start).and_then(|s| s.local_date);
            let (Some(id), Some(name), Some(date)) = (event.id, event.name, local_date) else {
                tracing::debug!("Skipping ticketing event without id, name or date");
                return None;
            };

            let mut candidate = RawCandidate::new(name, date).with_native_id(id);
            if let Some(venue) = event
                .embedded
                .and_then(|e| e.venues.into_iter().next())
                .and_then(|v| v.name)
            {
                candidate = candidate.with_venue(venue);
            }
            if let Some(url) = event.url {
                candidate = candidate.with_ticket_url(url);
            }
            Some(candidate)
        })
        .collect();

    Ok(candidates)
}
