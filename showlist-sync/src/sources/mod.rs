//! Source adapters
//!
//! Every origin type is one variant of [`SourceAdapter`]; venue-specific
//! scrapers are configuration instances of those variants, not separate
//! code paths.
//!
//! | variant | provenance |
//! |---|---|
//! | `Api` | Api |
//! | `HeuristicText` | ScrapedHeuristic |
//! | `StructuredData` | ScrapedStructured |
//! | `Manual` | Manual |

pub mod fetcher;
pub mod heuristic_text;
pub mod manual;
pub mod structured_data;
pub mod ticketing_api;

pub use fetcher::{FetchError, HttpPageFetcher, PageFetcher, StaticPageFetcher};
pub use heuristic_text::HeuristicTextSource;
pub use manual::ManualSource;
pub use structured_data::{PageSourceSettings, StructuredDataSource};
pub use ticketing_api::{TicketingApiSettings, TicketingApiSource};

use std::sync::Arc;
use std::time::Duration;

use crate::config::SyncSettings;
use crate::error::SyncResult;
use crate::models::{RawCandidate, SourceProvenance, SourceTag};

/// Source tag of the manual override list
pub const MANUAL_SOURCE_NAME: &str = "manual";

/// One configured source
pub enum SourceAdapter {
    Api(TicketingApiSource),
    StructuredData(StructuredDataSource),
    HeuristicText(HeuristicTextSource),
    Manual(ManualSource),
}

/// Outcome of one adapter's fetch after fail-closed handling
#[derive(Debug, Clone)]
pub struct SourceFetch {
    pub tag: SourceTag,
    pub candidates: Vec<RawCandidate>,
    /// True when the adapter errored or timed out (candidates is then empty)
    pub failed: bool,
}

impl SourceAdapter {
    pub fn name(&self) -> &str {
        match self {
            SourceAdapter::Api(s) => s.name(),
            SourceAdapter::StructuredData(s) => s.name(),
            SourceAdapter::HeuristicText(s) => s.name(),
            SourceAdapter::Manual(s) => s.name(),
        }
    }

    pub fn provenance(&self) -> SourceProvenance {
        match self {
            SourceAdapter::Api(_) => SourceProvenance::Api,
            SourceAdapter::StructuredData(_) => SourceProvenance::ScrapedStructured,
            SourceAdapter::HeuristicText(_) => SourceProvenance::ScrapedHeuristic,
            SourceAdapter::Manual(_) => SourceProvenance::Manual,
        }
    }

    /// Venue a page source covers; API and manual candidates name their own
    pub fn venue(&self) -> Option<&str> {
        match self {
            SourceAdapter::StructuredData(s) => Some(s.venue()),
            SourceAdapter::HeuristicText(s) => Some(s.venue()),
            SourceAdapter::Api(_) | SourceAdapter::Manual(_) => None,
        }
    }

    pub fn tag(&self) -> SourceTag {
        SourceTag {
            name: self.name().to_string(),
            provenance: self.provenance(),
            venue: self.venue().map(str::to_string),
        }
    }

    /// Fetch candidates, surfacing errors
    pub async fn fetch(&self) -> SyncResult<Vec<RawCandidate>> {
        match self {
            SourceAdapter::Api(s) => s.fetch().await,
            SourceAdapter::StructuredData(s) => s.fetch().await,
            SourceAdapter::HeuristicText(s) => s.fetch().await,
            SourceAdapter::Manual(s) => Ok(s.fetch()),
        }
    }

    /// Fetch candidates, failing closed
    ///
    /// Errors and timeouts are logged and turn into an empty candidate list
    /// so the rest of the pass proceeds.
    pub async fn fetch_fail_closed(&self, timeout: Duration) -> SourceFetch {
        let tag = self.tag();

        match tokio::time::timeout(timeout, self.fetch()).await {
            Ok(Ok(candidates)) => SourceFetch {
                tag,
                candidates,
                failed: false,
            },
            Ok(Err(e)) => {
                tracing::warn!(source = %tag.name, error = %e, "Source failed, continuing without it");
                SourceFetch {
                    tag,
                    candidates: Vec::new(),
                    failed: true,
                }
            }
            Err(_) => {
                tracing::warn!(
                    source = %tag.name,
                    timeout_secs = timeout.as_secs_f64(),
                    "Source timed out, continuing without it"
                );
                SourceFetch {
                    tag,
                    candidates: Vec::new(),
                    failed: true,
                }
            }
        }
    }
}

/// Build the configured sources in merge order
///
/// Order is fixed (API, heuristic pages, structured pages, manual list) so
/// that repeated passes resolve same-tier conflicts identically. The API
/// source is omitted when disabled or when no key is configured.
pub fn build_sources(settings: &SyncSettings, fetcher: Arc<dyn PageFetcher>) -> Vec<SourceAdapter> {
    let mut sources = Vec::new();

    match &settings.ticketing {
        Some(ticketing) => sources.push(SourceAdapter::Api(TicketingApiSource::new(
            ticketing.clone(),
            Arc::clone(&fetcher),
        ))),
        None => tracing::warn!("Ticketing API source not configured (disabled or no API key)"),
    }

    for page in &settings.heuristic_sources {
        sources.push(SourceAdapter::HeuristicText(HeuristicTextSource::new(
            page.clone(),
            Arc::clone(&fetcher),
        )));
    }

    for page in &settings.structured_sources {
        sources.push(SourceAdapter::StructuredData(StructuredDataSource::new(
            page.clone(),
            Arc::clone(&fetcher),
        )));
    }

    if !settings.manual.is_empty() {
        sources.push(SourceAdapter::Manual(ManualSource::new(
            MANUAL_SOURCE_NAME,
            settings.manual.clone(),
        )));
    }

    tracing::info!(count = sources.len(), "Configured sources");

    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct SlowFetcher;

    #[async_trait]
    impl PageFetcher for SlowFetcher {
        async fn get_text(&self, _url: &str, _query: &[(&str, String)]) -> Result<String, FetchError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(String::new())
        }
    }

    fn page(name: &str) -> PageSourceSettings {
        PageSourceSettings {
            name: name.to_string(),
            venue: "The Earl".to_string(),
            url: format!("https://{}.example/calendar", name),
        }
    }

    #[tokio::test]
    async fn test_error_fails_closed() {
        let source = SourceAdapter::StructuredData(StructuredDataSource::new(
            page("earl"),
            Arc::new(StaticPageFetcher::new()),
        ));

        let outcome = source.fetch_fail_closed(Duration::from_secs(1)).await;

        assert!(outcome.failed);
        assert!(outcome.candidates.is_empty());
        assert_eq!(outcome.tag.provenance, SourceProvenance::ScrapedStructured);
        assert_eq!(outcome.tag.venue.as_deref(), Some("The Earl"));
    }

    #[tokio::test]
    async fn test_timeout_fails_closed() {
        let source = SourceAdapter::HeuristicText(HeuristicTextSource::new(page("boggs"), Arc::new(SlowFetcher)));

        let outcome = source.fetch_fail_closed(Duration::from_millis(50)).await;

        assert!(outcome.failed);
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn test_build_sources_order() {
        let settings = SyncSettings {
            structured_sources: vec![page("earl")],
            heuristic_sources: vec![page("boggs")],
            manual: vec![showlist_common::config::ManualEntryConfig {
                date: "2026-01-23".to_string(),
                name: "HIGH ON FIRE".to_string(),
                venue: "529".to_string(),
                lineup: None,
                ticket_url: None,
            }],
            ..SyncSettings::default()
        };

        let sources = build_sources(&settings, Arc::new(StaticPageFetcher::new()));
        let provenances: Vec<_> = sources.iter().map(SourceAdapter::provenance).collect();

        assert_eq!(
            provenances,
            vec![
                SourceProvenance::ScrapedHeuristic,
                SourceProvenance::ScrapedStructured,
                SourceProvenance::Manual
            ]
        );
    }
}
