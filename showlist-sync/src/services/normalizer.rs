//! Candidate normalization
//!
//! Turns a source-shaped [`TaggedCandidate`] into an [`EventDraft`]:
//! canonical venue, cleaned display name, resolved calendar date and
//! identity key. Anything that cannot be normalized is reported as
//! `MalformedCandidate` for the caller to drop.

use chrono::NaiveDate;
use regex::Regex;
use showlist_common::time::format_iso_date;

use super::dates::resolve_date;
use super::venues::VenueCatalog;
use crate::error::{SyncError, SyncResult};
use crate::models::{EventDraft, KeyKind, TaggedCandidate};

/// Characters of the cleaned name kept in a derived identity key
pub const NAME_KEY_CHARS: usize = 24;

/// Shortest display name accepted
const MIN_NAME_CHARS: usize = 2;

/// Candidate normalizer
pub struct Normalizer {
    venues: VenueCatalog,
}

impl Normalizer {
    pub fn new(venues: VenueCatalog) -> Self {
        Self { venues }
    }

    pub fn venues(&self) -> &VenueCatalog {
        &self.venues
    }

    /// Normalize one candidate against `today`
    ///
    /// Past dates are rejected along with missing venues, unusable names
    /// and unparseable dates.
    pub fn normalize(&self, tagged: &TaggedCandidate, today: NaiveDate) -> SyncResult<EventDraft> {
        let candidate = &tagged.candidate;

        let raw_venue = candidate
            .venue
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .or(tagged.tag.venue.as_deref())
            .ok_or_else(|| SyncError::MalformedCandidate(format!("'{}' has no venue", candidate.name)))?;

        let (venue_name, venue_key) = self
            .venues
            .canonicalize(raw_venue)
            .ok_or_else(|| SyncError::MalformedCandidate(format!("unusable venue '{}'", raw_venue)))?;

        let display_name = clean_name(&candidate.name, &[raw_venue, venue_name.as_str()])
            .ok_or_else(|| SyncError::MalformedCandidate(format!("unusable name '{}'", candidate.name)))?;

        let event_date = resolve_date(&candidate.date_text, today).ok_or_else(|| {
            SyncError::MalformedCandidate(format!("unparseable date '{}' for '{}'", candidate.date_text, display_name))
        })?;

        if event_date < today {
            return Err(SyncError::MalformedCandidate(format!(
                "'{}' on {} is already past",
                display_name, event_date
            )));
        }

        let native_id = candidate.native_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
        let (identity_key, key_kind) = match native_id {
            Some(id) => (native_key(&tagged.tag.name, id), KeyKind::Native),
            None => (derived_key(&venue_key, event_date, &display_name), KeyKind::Derived),
        };

        let ticket_url = candidate
            .ticket_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        Ok(EventDraft {
            identity_key,
            key_kind,
            display_name,
            event_date,
            venue_name,
            venue_key,
            ticket_url,
            provenance: tagged.tag.provenance,
            source: tagged.tag.name.clone(),
        })
    }
}

/// Source-qualified identity key
pub fn native_key(source: &str, native_id: &str) -> String {
    format!("{}:{}", source, native_id)
}

/// Identity key built from venue, date and name
pub fn derived_key(venue_key: &str, event_date: NaiveDate, display_name: &str) -> String {
    format!("{}|{}|{}", venue_key, format_iso_date(event_date), name_key(display_name))
}

/// Lowercase alphanumeric characters of a name, truncated
pub fn name_key(display_name: &str) -> String {
    display_name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .take(NAME_KEY_CHARS)
        .collect()
}

/// Clean a raw show name
///
/// Strips `"@ <venue>..."` / `" at <venue>..."` tails and a
/// `"<venue> presents"` lead-in for every given venue spelling, then
/// collapses whitespace and trims stray separators. Returns `None` when
/// what is left is too short, has no letters or digits, or is just the
/// venue name.
pub fn clean_name(raw: &str, venue_spellings: &[&str]) -> Option<String> {
    let mut name = collapse_whitespace(raw);

    for spelling in venue_variants(venue_spellings) {
        let escaped = regex::escape(&spelling);
        let boundary = if spelling.ends_with(char::is_alphanumeric) { r"\b" } else { "" };

        if let Ok(tail) = Regex::new(&format!(r"(?i)\s*(?:@|\bat\b)\s*{}{}.*$", escaped, boundary)) {
            name = tail.replace(&name, "").into_owned();
        }
        if let Ok(lead) = Regex::new(&format!(r"(?i)^{}\s+presents?\b\s*:?\s*", escaped)) {
            name = lead.replace(&name, "").into_owned();
        }
    }

    let name = collapse_whitespace(trim_separators(&name));

    if name.chars().count() < MIN_NAME_CHARS || !name.chars().any(char::is_alphanumeric) {
        return None;
    }

    let is_venue = venue_variants(venue_spellings)
        .iter()
        .any(|v| v.to_lowercase() == name.to_lowercase());
    if is_venue {
        return None;
    }

    Some(name)
}

/// Venue spellings plus their forms without a leading "The", longest first
fn venue_variants(spellings: &[&str]) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();

    for spelling in spellings {
        let spelling = collapse_whitespace(spelling);
        if spelling.is_empty() {
            continue;
        }

        let without_article = spelling
            .get(..4)
            .filter(|prefix| prefix.eq_ignore_ascii_case("the "))
            .map(|_| spelling[4..].trim().to_string());

        for variant in std::iter::once(spelling.clone()).chain(without_article) {
            if !variant.is_empty() && !variants.iter().any(|v| v.eq_ignore_ascii_case(&variant)) {
                variants.push(variant);
            }
        }
    }

    variants.sort_by_key(|v| std::cmp::Reverse(v.len()));
    variants
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | '|' | ':' | ',' | '/' | '@' | '•'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawCandidate, SourceProvenance, SourceTag};
    use showlist_common::config::VenueConfig;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn earl_normalizer() -> Normalizer {
        Normalizer::new(VenueCatalog::from_config(
            &[VenueConfig {
                name: "The EARL".to_string(),
                aliases: vec![],
            }],
            Vec::<&str>::new(),
        ))
    }

    fn tagged(candidate: RawCandidate, provenance: SourceProvenance) -> TaggedCandidate {
        TaggedCandidate {
            tag: SourceTag {
                name: "earl".to_string(),
                provenance,
                venue: Some("The EARL".to_string()),
            },
            candidate,
        }
    }

    #[test]
    fn test_clean_name_strips_venue_attribution() {
        assert_eq!(clean_name("High On Fire @ The EARL", &["The EARL"]).as_deref(), Some("High On Fire"));
        assert_eq!(clean_name("High On Fire at the Earl, Atlanta GA", &["The EARL"]).as_deref(), Some("High On Fire"));
        assert_eq!(clean_name("High On Fire @ EARL", &["The EARL"]).as_deref(), Some("High On Fire"));
    }

    #[test]
    fn test_clean_name_strips_presents_prefix() {
        assert_eq!(
            clean_name("The EARL presents: Joshua   Quimby", &["The EARL"]).as_deref(),
            Some("Joshua Quimby")
        );
    }

    #[test]
    fn test_clean_name_keeps_unrelated_at() {
        assert_eq!(
            clean_name("Death at the Disco", &["The EARL"]).as_deref(),
            Some("Death at the Disco")
        );
    }

    #[test]
    fn test_clean_name_rejects_placeholders() {
        assert_eq!(clean_name("", &["The EARL"]), None);
        assert_eq!(clean_name("X", &["The EARL"]), None);
        assert_eq!(clean_name(" -- ", &["The EARL"]), None);
        assert_eq!(clean_name("the earl", &["The EARL"]), None);
    }

    #[test]
    fn test_name_key_truncates() {
        assert_eq!(name_key("High On Fire"), "highonfire");
        assert_eq!(name_key("Show Me The Body / Machine Girl").len(), NAME_KEY_CHARS);
    }

    #[test]
    fn test_normalize_derived_key() {
        let draft = earl_normalizer()
            .normalize(
                &tagged(
                    RawCandidate::new("High On Fire @ The EARL", "Fri, Jan 23").with_venue("the earl"),
                    SourceProvenance::ScrapedHeuristic,
                ),
                ymd(2026, 1, 10),
            )
            .unwrap();

        assert_eq!(draft.display_name, "High On Fire");
        assert_eq!(draft.venue_name, "The EARL");
        assert_eq!(draft.event_date, ymd(2026, 1, 23));
        assert_eq!(draft.identity_key, "earl|2026-01-23|highonfire");
        assert_eq!(draft.key_kind, KeyKind::Derived);
    }

    #[test]
    fn test_normalize_native_key_and_source_venue_fallback() {
        let draft = earl_normalizer()
            .normalize(
                &tagged(
                    RawCandidate::new("ENMY", "2026-01-20").with_native_id("G5vYZb9Kx"),
                    SourceProvenance::Api,
                ),
                ymd(2026, 1, 10),
            )
            .unwrap();

        assert_eq!(draft.identity_key, "earl:G5vYZb9Kx");
        assert_eq!(draft.key_kind, KeyKind::Native);
        assert_eq!(draft.venue_name, "The EARL");
    }

    #[test]
    fn test_normalize_rejects_bad_candidates() {
        let normalizer = earl_normalizer();
        let today = ymd(2026, 1, 10);

        let bad_date = tagged(RawCandidate::new("ENMY", "TBA"), SourceProvenance::Api);
        assert!(matches!(
            normalizer.normalize(&bad_date, today),
            Err(SyncError::MalformedCandidate(_))
        ));

        let past = tagged(RawCandidate::new("ENMY", "2026-01-09"), SourceProvenance::Api);
        assert!(matches!(normalizer.normalize(&past, today), Err(SyncError::MalformedCandidate(_))));

        let mut no_venue = tagged(RawCandidate::new("ENMY", "2026-01-20"), SourceProvenance::Manual);
        no_venue.tag.venue = None;
        assert!(matches!(
            normalizer.normalize(&no_venue, today),
            Err(SyncError::MalformedCandidate(_))
        ));
    }
}
