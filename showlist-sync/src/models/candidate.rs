//! Raw, source-shaped candidate records

use super::SourceProvenance;

/// Pre-normalization record emitted by a source adapter
///
/// Only `name` and `date_text` are guaranteed; everything else depends on
/// what the source exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub name: String,
    /// Date as the source wrote it ("2026-01-23", "Fri, Jan 23", ...)
    pub date_text: String,
    /// Venue spelling as the source wrote it
    pub venue: Option<String>,
    pub ticket_url: Option<String>,
    /// Stable identifier assigned by the source, if any
    pub native_id: Option<String>,
}

impl RawCandidate {
    pub fn new(name: impl Into<String>, date_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            date_text: date_text.into(),
            venue: None,
            ticket_url: None,
            native_id: None,
        }
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = Some(venue.into());
        self
    }

    pub fn with_ticket_url(mut self, url: impl Into<String>) -> Self {
        self.ticket_url = Some(url.into());
        self
    }

    pub fn with_native_id(mut self, id: impl Into<String>) -> Self {
        self.native_id = Some(id.into());
        self
    }
}

/// Identity of the adapter a candidate came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTag {
    /// Configured source name ("ticketmaster", "earl", ...)
    pub name: String,
    pub provenance: SourceProvenance,
    /// Venue the source covers, used when a candidate names none
    pub venue: Option<String>,
}

/// Candidate paired with its origin
#[derive(Debug, Clone)]
pub struct TaggedCandidate {
    pub tag: SourceTag,
    pub candidate: RawCandidate,
}
