//! Canonical event records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SourceProvenance;

/// How an identity key was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Source-qualified stable id (`"ticketmaster:G5vYZ..."`)
    Native,
    /// Built from venue, date and name; can collide for different shows
    Derived,
}

/// Normalized candidate, ready to merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub identity_key: String,
    pub key_kind: KeyKind,
    pub display_name: String,
    pub event_date: NaiveDate,
    /// Canonical venue display name
    pub venue_name: String,
    /// Normalized venue key used for matching
    pub venue_key: String,
    pub ticket_url: Option<String>,
    pub provenance: SourceProvenance,
    /// Adapter name, for logging
    pub source: String,
}

/// Stored canonical event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub identity_key: String,
    pub display_name: String,
    pub event_date: NaiveDate,
    pub venue_name: String,
    pub ticket_url: Option<String>,
    pub source_provenance: SourceProvenance,
    /// Date of the last pass that saw this event from its winning source
    pub last_seen_at: NaiveDate,
}

impl CanonicalEvent {
    /// Build a new row from a draft
    pub fn from_draft(draft: &EventDraft, seen_on: NaiveDate) -> Self {
        Self {
            identity_key: draft.identity_key.clone(),
            display_name: draft.display_name.clone(),
            event_date: draft.event_date,
            venue_name: draft.venue_name.clone(),
            ticket_url: draft.ticket_url.clone(),
            source_provenance: draft.provenance,
            last_seen_at: seen_on,
        }
    }

    /// Overwrite the descriptive fields with a draft's, keeping the row's key
    pub fn apply_draft(&mut self, draft: &EventDraft, seen_on: NaiveDate) {
        self.display_name = draft.display_name.clone();
        self.event_date = draft.event_date;
        self.venue_name = draft.venue_name.clone();
        self.ticket_url = draft.ticket_url.clone();
        self.source_provenance = draft.provenance;
        self.last_seen_at = seen_on;
    }

    /// True when applying `draft` would change nothing but `last_seen_at`
    pub fn same_fields(&self, draft: &EventDraft) -> bool {
        self.display_name == draft.display_name
            && self.event_date == draft.event_date
            && self.venue_name == draft.venue_name
            && self.ticket_url == draft.ticket_url
            && self.source_provenance == draft.provenance
    }
}
