//! Sync settings resolved from the TOML configuration
//!
//! The ticketing API key follows the usual tier order:
//! 1. `SHOWLIST_TICKETING_API_KEY` environment variable
//! 2. `[ticketing] api_key` in the TOML file
//!
//! With no key the API source is left out of the pass.

use showlist_common::config::{ManualEntryConfig, TomlConfig, VenueConfig};
use showlist_common::time::secs_to_duration;
use std::time::Duration;

use crate::services::similarity::MatchThresholds;
use crate::sources::{PageSourceSettings, TicketingApiSettings};

/// Environment variable holding the ticketing API key
pub const TICKETING_API_KEY_ENV_VAR: &str = "SHOWLIST_TICKETING_API_KEY";

/// Source name of the ticketing API adapter (prefixes native identity keys)
pub const TICKETING_SOURCE_NAME: &str = "ticketmaster";

/// Everything a pass needs from configuration
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub adapter_timeout: Duration,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub lock_stale_after: Duration,
    pub thresholds: MatchThresholds,
    /// `None` when disabled or no API key is configured
    pub ticketing: Option<TicketingApiSettings>,
    pub heuristic_sources: Vec<PageSourceSettings>,
    pub structured_sources: Vec<PageSourceSettings>,
    pub manual: Vec<ManualEntryConfig>,
    pub venues: Vec<VenueConfig>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_toml(&TomlConfig::default(), None)
    }
}

impl SyncSettings {
    /// Build settings from a parsed config file and an already-resolved API key
    pub fn from_toml(config: &TomlConfig, api_key: Option<String>) -> Self {
        let ticketing = match api_key {
            Some(api_key) if config.ticketing.enabled => Some(TicketingApiSettings {
                name: TICKETING_SOURCE_NAME.to_string(),
                base_url: config.ticketing.base_url.clone(),
                api_key,
                city: config.ticketing.city.clone(),
                classification: config.ticketing.classification.clone(),
                page_size: config.ticketing.page_size,
            }),
            _ => None,
        };

        let pages = |entries: &[showlist_common::config::PageSourceConfig]| {
            entries
                .iter()
                .map(|p| PageSourceSettings {
                    name: p.name.clone(),
                    venue: p.venue.clone(),
                    url: p.url.clone(),
                })
                .collect::<Vec<_>>()
        };

        Self {
            adapter_timeout: secs_to_duration(config.sync.adapter_timeout_secs),
            http_timeout: secs_to_duration(config.sync.http_timeout_secs),
            user_agent: config.sync.user_agent.clone(),
            lock_stale_after: secs_to_duration(config.sync.lock_stale_secs),
            thresholds: MatchThresholds {
                containment: config.matching.containment_threshold,
                fuzzy: config.matching.fuzzy_threshold,
            },
            ticketing,
            heuristic_sources: pages(&config.heuristic_sources),
            structured_sources: pages(&config.structured_sources),
            manual: config.manual.clone(),
            venues: config.venues.clone(),
        }
    }

    /// Build settings, resolving the API key from the environment first
    pub fn resolve(config: &TomlConfig) -> Self {
        Self::from_toml(config, resolve_ticketing_api_key(config))
    }
}

/// Resolve the ticketing API key (ENV, then TOML)
pub fn resolve_ticketing_api_key(config: &TomlConfig) -> Option<String> {
    let from_env = std::env::var(TICKETING_API_KEY_ENV_VAR)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    let from_toml = config
        .ticketing
        .api_key
        .as_ref()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());

    match (from_env, from_toml) {
        (Some(env_key), Some(_)) => {
            tracing::warn!(
                "Ticketing API key found in both {} and config file; using environment",
                TICKETING_API_KEY_ENV_VAR
            );
            Some(env_key)
        }
        (Some(env_key), None) => {
            tracing::info!("Ticketing API key loaded from environment");
            Some(env_key)
        }
        (None, Some(toml_key)) => {
            tracing::info!("Ticketing API key loaded from config file");
            Some(toml_key)
        }
        (None, None) => None,
    }
}
