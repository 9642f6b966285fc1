//! Manually curated override list
//!
//! Entries come straight from configuration and always carry the highest
//! precedence. A lineup, when given, is appended to the name the way venue
//! calendars print it: `"HIGH ON FIRE (HOT RAM, Cheap Cigar)"`.

use showlist_common::config::ManualEntryConfig;

use crate::models::RawCandidate;

/// Manual override source
pub struct ManualSource {
    name: String,
    entries: Vec<ManualEntryConfig>,
}

impl ManualSource {
    pub fn new(name: impl Into<String>, entries: Vec<ManualEntryConfig>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Convert the configured entries; never fails
    pub fn fetch(&self) -> Vec<RawCandidate> {
        self.entries
            .iter()
            .filter(|entry| !entry.name.trim().is_empty() && !entry.date.trim().is_empty())
            .map(|entry| {
                let name = match entry.lineup.as_deref().map(str::trim) {
                    Some(lineup) if !lineup.is_empty() => format!("{} ({})", entry.name.trim(), lineup),
                    _ => entry.name.trim().to_string(),
                };

                let mut candidate = RawCandidate::new(name, entry.date.trim()).with_venue(entry.venue.as_str());
                if let Some(url) = &entry.ticket_url {
                    candidate = candidate.with_ticket_url(url.as_str());
                }
                candidate
            })
            .collect()
    }
}
