//! Structured-data (JSON-LD) venue page adapter
//!
//! Reads every `<script type="application/ld+json">` block on the page.
//! A block may hold a list, a single object, or an object with an `@graph`
//! array; only objects carrying `startDate` are events.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

use super::fetcher::PageFetcher;
use crate::error::{SyncError, SyncResult};
use crate::models::RawCandidate;

static LD_JSON_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid JSON-LD block pattern")
});

/// Structured-data page source settings
#[derive(Debug, Clone)]
pub struct PageSourceSettings {
    pub name: String,
    /// Venue the page lists shows for
    pub venue: String,
    pub url: String,
}

/// JSON-LD venue page adapter
pub struct StructuredDataSource {
    settings: PageSourceSettings,
    fetcher: Arc<dyn PageFetcher>,
}

impl StructuredDataSource {
    pub fn new(settings: PageSourceSettings, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { settings, fetcher }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn venue(&self) -> &str {
        &self.settings.venue
    }

    pub async fn fetch(&self) -> SyncResult<Vec<RawCandidate>> {
        let page = self
            .fetcher
            .get_text(&self.settings.url, &[])
            .await
            .map_err(|e| SyncError::source_unavailable(&self.settings.name, e))?;

        let candidates = extract_structured_events(&page, &self.settings.url);

        tracing::info!(
            source = %self.settings.name,
            venue = %self.settings.venue,
            count = candidates.len(),
            "Extracted structured-data events"
        );

        Ok(candidates)
    }
}

/// Extract event candidates from the JSON-LD blocks of a page
///
/// Blocks that fail to parse are skipped individually. `page_url` is the
/// ticket link fallback for items without their own `url`. Repeated
/// name/date pairs are reported once.
pub fn extract_structured_events(page: &str, page_url: &str) -> Vec<RawCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for capture in LD_JSON_BLOCK.captures_iter(page) {
        let content = capture[1].trim();
        if content.is_empty() {
            continue;
        }

        let data: Value = match serde_json::from_str(content) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unparseable JSON-LD block");
                continue;
            }
        };

        for item in potential_items(&data) {
            let Some(candidate) = event_from_item(item, page_url) else {
                continue;
            };
            if seen.insert((candidate.name.clone(), candidate.date_text.clone())) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

/// Flatten lists, `@graph` wrappers and single objects into one item list
fn potential_items(data: &Value) -> Vec<&Value> {
    match data {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(graph)) => graph.iter().collect(),
            _ => vec![data],
        },
        _ => Vec::new(),
    }
}

fn event_from_item(item: &Value, page_url: &str) -> Option<RawCandidate> {
    let object = item.as_object()?;
    let start_date = object.get("startDate")?.as_str()?.trim();
    let name = object.get("name").and_then(Value::as_str).unwrap_or("").trim();

    if name.is_empty() || start_date.is_empty() {
        return None;
    }

    // "2026-01-23T20:00:00-05:00" -> "2026-01-23"
    let date_text = start_date.split('T').next().unwrap_or(start_date);

    let ticket_url = object
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(page_url);

    let mut candidate = RawCandidate::new(name, date_text).with_ticket_url(ticket_url);
    if let Some(venue) = location_name(object.get("location")) {
        candidate = candidate.with_venue(venue);
    }
    Some(candidate)
}

/// `location` may be an object or a list of objects
fn location_name(location: Option<&Value>) -> Option<String> {
    let location = match location? {
        Value::Array(items) => items.first()?,
        other => other,
    };
    location
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://www.bandsintown.com/v/10001781-the-earl";

    #[test]
    fn test_graph_and_list_blocks() {
        let page = r#"
            <html><head>
            <script type="application/ld+json">
            {"@context": "https://schema.org", "@graph": [
                {"@type": "MusicEvent", "name": "High On Fire @ The EARL",
                 "startDate": "2026-01-23T20:00:00-05:00",
                 "url": "https://tix.example/hof",
                 "location": {"@type": "Place", "name": "The EARL"}},
                {"@type": "Organization", "name": "Bandsintown"}
            ]}
            </script>
            <script type='application/ld+json'>
            [{"@type": "MusicEvent", "name": "Joshua Quimby", "startDate": "2026-01-30"}]
            </script>
            </head></html>
        "#;

        let events = extract_structured_events(page, PAGE_URL);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "High On Fire @ The EARL");
        assert_eq!(events[0].date_text, "2026-01-23");
        assert_eq!(events[0].venue.as_deref(), Some("The EARL"));
        assert_eq!(events[0].ticket_url.as_deref(), Some("https://tix.example/hof"));
        assert_eq!(events[1].ticket_url.as_deref(), Some(PAGE_URL));
        assert!(events[1].venue.is_none());
    }

    #[test]
    fn test_bad_block_does_not_hide_good_block() {
        let page = r#"
            <script type="application/ld+json">{ not json </script>
            <script type="application/ld+json">{"name": "ENMY", "startDate": "2026-01-20"}</script>
        "#;

        let events = extract_structured_events(page, PAGE_URL);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "ENMY");
    }

    #[test]
    fn test_items_without_start_date_or_name_skipped() {
        let page = r#"<script type="application/ld+json">
            [{"name": "Venue page"}, {"name": "", "startDate": "2026-01-20"}]
        </script>"#;
        assert!(extract_structured_events(page, PAGE_URL).is_empty());
    }

    #[test]
    fn test_repeated_events_reported_once() {
        let block = r#"<script type="application/ld+json">{"name": "SUMPP", "startDate": "2026-01-22"}</script>"#;
        let page = format!("{}{}", block, block);
        assert_eq!(extract_structured_events(&page, PAGE_URL).len(), 1);
    }
}
