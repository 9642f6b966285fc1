//! Deduplication and precedence merge
//!
//! The merger holds the stored rows of one pass plus everything staged so
//! far and applies drafts one at a time, in a fixed order.
//!
//! **Matching:**
//! 1. identity key equal
//! 2. otherwise same venue key and date, and the names pass
//!    [`names_match`]
//!
//! **Merge rule:** a lower-precedence draft never touches a matched row; an
//! equal or higher one overwrites its fields in place, the row keeping its
//! stored identity key. A derived key shared by two dissimilar names is a
//! collision and the draft is left out.
//!
//! Per-draft decisions are provisional for matched rows. Two same-tier
//! drafts for one show overwrite each other within a pass, so whether a
//! stored row really changed is settled against its loaded state once all
//! drafts are merged ([`EventMerger::tally`], [`EventMerger::changed`]).

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

use super::similarity::{names_match, MatchThresholds};
use super::venues::venue_key;
use crate::error::SyncError;
use crate::models::{CanonicalEvent, EventDraft, KeyKind};

/// What merging one draft did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeDecision {
    /// New row staged
    Inserted,
    /// Matched row's fields overwritten
    Updated,
    /// Matched row already had these fields
    Unchanged,
    /// Matched row has higher precedence
    Ignored,
    /// Derived key taken by a different show
    Collision,
}

type Slot = (String, NaiveDate);

/// Pass-level merge counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeTally {
    pub new: usize,
    /// Matching drafts whose row ends the pass different from how it was loaded
    pub updated: usize,
    /// Matching drafts whose row ends the pass as it was loaded
    pub unchanged: usize,
    pub ignored: usize,
    pub collisions: usize,
}

/// Stateful merger for one pass
pub struct EventMerger {
    thresholds: MatchThresholds,
    seen_on: NaiveDate,
    events: HashMap<String, CanonicalEvent>,
    /// Rows as loaded, before any draft of this pass
    loaded: HashMap<String, CanonicalEvent>,
    /// Keys per (venue key, date), in arrival order
    slots: HashMap<Slot, Vec<String>>,
    /// Keys touched by an insert, update or refresh
    dirty: BTreeSet<String>,
    /// Row key of every draft that matched without being ignored
    matched: Vec<String>,
    inserted: usize,
    ignored: usize,
    collisions: usize,
}

impl EventMerger {
    /// Start from the stored rows; `seen_on` stamps `last_seen_at`
    pub fn new(stored: Vec<CanonicalEvent>, thresholds: MatchThresholds, seen_on: NaiveDate) -> Self {
        let mut merger = Self {
            thresholds,
            seen_on,
            events: HashMap::with_capacity(stored.len()),
            loaded: HashMap::with_capacity(stored.len()),
            slots: HashMap::new(),
            dirty: BTreeSet::new(),
            matched: Vec::new(),
            inserted: 0,
            ignored: 0,
            collisions: 0,
        };

        for event in stored {
            merger.index(&event);
            merger.loaded.insert(event.identity_key.clone(), event.clone());
            merger.events.insert(event.identity_key.clone(), event);
        }

        merger
    }

    /// Merge one draft
    pub fn merge(&mut self, draft: &EventDraft) -> MergeDecision {
        let (decision, key) = self.merge_draft(draft);
        match decision {
            MergeDecision::Inserted => self.inserted += 1,
            MergeDecision::Updated | MergeDecision::Unchanged => self.matched.push(key),
            MergeDecision::Ignored => self.ignored += 1,
            MergeDecision::Collision => self.collisions += 1,
        }
        decision
    }

    /// Counts for the pass so far, matched rows judged by their current state
    pub fn tally(&self) -> MergeTally {
        let (updated, unchanged) = self
            .matched
            .iter()
            .fold((0, 0), |(updated, unchanged), key| {
                if self.fields_changed(key) {
                    (updated + 1, unchanged)
                } else {
                    (updated, unchanged + 1)
                }
            });

        MergeTally {
            new: self.inserted,
            updated,
            unchanged,
            ignored: self.ignored,
            collisions: self.collisions,
        }
    }

    fn merge_draft(&mut self, draft: &EventDraft) -> (MergeDecision, String) {
        if let Some(stored) = self.events.get(&draft.identity_key) {
            if draft.key_kind == KeyKind::Derived
                && !names_match(&stored.display_name, &draft.display_name, &self.thresholds)
            {
                let collision = SyncError::IdentityCollision {
                    key: draft.identity_key.clone(),
                    stored: stored.display_name.clone(),
                    incoming: draft.display_name.clone(),
                };
                tracing::warn!(source = %draft.source, "{}; left for manual review", collision);
                return (MergeDecision::Collision, draft.identity_key.clone());
            }

            let key = draft.identity_key.clone();
            let decision = self.apply(&key, draft);
            return (decision, key);
        }

        match self.find_fallback_match(draft) {
            Some(key) => {
                tracing::debug!(
                    identity_key = %key,
                    incoming_key = %draft.identity_key,
                    name = %draft.display_name,
                    "Matched by venue, date and name"
                );
                let decision = self.apply(&key, draft);
                (decision, key)
            }
            None => {
                let event = CanonicalEvent::from_draft(draft, self.seen_on);
                self.index(&event);
                self.dirty.insert(event.identity_key.clone());
                let key = event.identity_key.clone();
                self.events.insert(key.clone(), event);
                (MergeDecision::Inserted, key)
            }
        }
    }

    /// Rows that need writing, in key order
    ///
    /// New rows, plus stored rows whose current state differs from how they
    /// were loaded. A row overwritten and then restored within the pass is
    /// left out.
    pub fn changed(&self) -> Vec<&CanonicalEvent> {
        self.dirty
            .iter()
            .filter_map(|key| self.events.get(key))
            .filter(|event| self.loaded.get(&event.identity_key) != Some(*event))
            .collect()
    }

    /// Current row for a key (stored or staged)
    pub fn get(&self, identity_key: &str) -> Option<&CanonicalEvent> {
        self.events.get(identity_key)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// True when the row's fields differ from its loaded state, or it is new
    fn fields_changed(&self, key: &str) -> bool {
        match (self.loaded.get(key), self.events.get(key)) {
            (Some(loaded), Some(current)) => {
                loaded.display_name != current.display_name
                    || loaded.event_date != current.event_date
                    || loaded.venue_name != current.venue_name
                    || loaded.ticket_url != current.ticket_url
                    || loaded.source_provenance != current.source_provenance
            }
            _ => true,
        }
    }

    fn find_fallback_match(&self, draft: &EventDraft) -> Option<String> {
        let slot = (draft.venue_key.clone(), draft.event_date);
        self.slots.get(&slot)?.iter().find_map(|key| {
            let event = self.events.get(key)?;
            names_match(&event.display_name, &draft.display_name, &self.thresholds).then(|| key.clone())
        })
    }

    fn apply(&mut self, key: &str, draft: &EventDraft) -> MergeDecision {
        let Some(event) = self.events.get_mut(key) else {
            tracing::error!(
                identity_key = %key,
                source = %draft.source,
                "Matched key missing from merger state, draft skipped"
            );
            return MergeDecision::Ignored;
        };

        if draft.provenance < event.source_provenance {
            tracing::debug!(
                identity_key = %key,
                stored = %event.source_provenance,
                incoming = %draft.provenance,
                "Lower precedence, ignored"
            );
            return MergeDecision::Ignored;
        }

        if event.same_fields(draft) {
            if event.last_seen_at != self.seen_on {
                event.last_seen_at = self.seen_on;
                self.dirty.insert(key.to_string());
            }
            return MergeDecision::Unchanged;
        }

        let old_slot = (venue_key(&event.venue_name), event.event_date);
        event.apply_draft(draft, self.seen_on);
        let new_slot = (venue_key(&event.venue_name), event.event_date);

        if old_slot != new_slot {
            tracing::info!(
                identity_key = %key,
                from = %old_slot.1,
                to = %new_slot.1,
                "Event moved, updating in place"
            );
            if let Some(keys) = self.slots.get_mut(&old_slot) {
                keys.retain(|k| k != key);
            }
            self.slots.entry(new_slot).or_default().push(key.to_string());
        }

        self.dirty.insert(key.to_string());
        MergeDecision::Updated
    }

    fn index(&mut self, event: &CanonicalEvent) {
        self.slots
            .entry((venue_key(&event.venue_name), event.event_date))
            .or_default()
            .push(event.identity_key.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceProvenance;
    use crate::services::normalizer::derived_key;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(name: &str, provenance: SourceProvenance) -> EventDraft {
        let date = ymd(2026, 1, 23);
        EventDraft {
            identity_key: derived_key("earl", date, name),
            key_kind: KeyKind::Derived,
            display_name: name.to_string(),
            event_date: date,
            venue_name: "The EARL".to_string(),
            venue_key: "earl".to_string(),
            ticket_url: None,
            provenance,
            source: provenance.to_string(),
        }
    }

    fn merger() -> EventMerger {
        EventMerger::new(Vec::new(), MatchThresholds::default(), ymd(2026, 1, 10))
    }

    #[test]
    fn test_higher_precedence_wins_in_either_order() {
        let heuristic = draft("High On Fire", SourceProvenance::ScrapedHeuristic);
        let manual = draft("HIGH ON FIRE (HOT RAM, Cheap Cigar)", SourceProvenance::Manual);

        for order in [[&heuristic, &manual], [&manual, &heuristic]] {
            let mut merger = merger();
            for d in order {
                merger.merge(d);
            }

            let changed = merger.changed();
            assert_eq!(changed.len(), 1);
            assert_eq!(changed[0].display_name, "HIGH ON FIRE (HOT RAM, Cheap Cigar)");
            assert_eq!(changed[0].source_provenance, SourceProvenance::Manual);
        }
    }

    #[test]
    fn test_fallback_match_keeps_stored_key() {
        let mut merger = merger();
        let first = draft("Show Me The Body / Machine Girl", SourceProvenance::ScrapedHeuristic);
        let second = draft("Machine Girl, Show Me The Body", SourceProvenance::ScrapedStructured);

        assert_eq!(merger.merge(&first), MergeDecision::Inserted);
        assert_eq!(merger.merge(&second), MergeDecision::Updated);

        assert_eq!(merger.len(), 1);
        let event = merger.get(&first.identity_key).unwrap();
        assert_eq!(event.display_name, "Machine Girl, Show Me The Body");
    }

    #[test]
    fn test_same_draft_twice_is_unchanged() {
        let mut merger = merger();
        let d = draft("Joshua Quimby", SourceProvenance::Api);
        assert_eq!(merger.merge(&d), MergeDecision::Inserted);
        assert_eq!(merger.merge(&d), MergeDecision::Unchanged);
    }

    #[test]
    fn test_lower_precedence_is_ignored() {
        let stored = CanonicalEvent::from_draft(&draft("ENMY", SourceProvenance::ScrapedStructured), ymd(2026, 1, 9));
        let mut merger = EventMerger::new(vec![stored], MatchThresholds::default(), ymd(2026, 1, 10));

        let mut api = draft("ENMY", SourceProvenance::Api);
        api.ticket_url = Some("https://tix.example/enmy".to_string());

        assert_eq!(merger.merge(&api), MergeDecision::Ignored);
        assert!(merger.changed().is_empty());
    }

    #[test]
    fn test_unchanged_row_refreshes_last_seen() {
        let stored = CanonicalEvent::from_draft(&draft("ENMY", SourceProvenance::Api), ymd(2026, 1, 9));
        let mut merger = EventMerger::new(vec![stored], MatchThresholds::default(), ymd(2026, 1, 10));

        assert_eq!(merger.merge(&draft("ENMY", SourceProvenance::Api)), MergeDecision::Unchanged);
        assert_eq!(merger.changed()[0].last_seen_at, ymd(2026, 1, 10));
    }

    #[test]
    fn test_derived_key_collision_not_applied() {
        let mut merger = merger();
        let bluegrass = draft("Fiddle Fest Championship Finals Bluegrass Bands", SourceProvenance::Manual);
        let youth = draft("Fiddle Fest Championship Finals Youth Division", SourceProvenance::Manual);
        assert_eq!(bluegrass.identity_key, youth.identity_key);

        assert_eq!(merger.merge(&bluegrass), MergeDecision::Inserted);
        assert_eq!(merger.merge(&youth), MergeDecision::Collision);

        let event = merger.get(&bluegrass.identity_key).unwrap();
        assert_eq!(event.display_name, bluegrass.display_name);
    }

    #[test]
    fn test_native_key_reschedule_moves_slot() {
        let mut api = draft("ENMY", SourceProvenance::Api);
        api.identity_key = "ticketmaster:G5v".to_string();
        api.key_kind = KeyKind::Native;

        let mut merger = merger();
        merger.merge(&api);

        let mut moved = api.clone();
        moved.event_date = ymd(2026, 2, 6);
        assert_eq!(merger.merge(&moved), MergeDecision::Updated);

        let mut scraped = draft("ENMY", SourceProvenance::ScrapedHeuristic);
        scraped.event_date = ymd(2026, 2, 6);
        scraped.identity_key = derived_key("earl", scraped.event_date, "ENMY");
        assert_eq!(merger.merge(&scraped), MergeDecision::Updated);
        assert_eq!(merger.len(), 1);
    }

    #[test]
    fn test_same_tier_later_draft_wins() {
        let mut merger = merger();
        let mut first = draft("ENMY", SourceProvenance::ScrapedStructured);
        first.ticket_url = Some("https://badearl.com/enmy".to_string());
        let mut second = first.clone();
        second.ticket_url = Some("https://www.bandsintown.com/e/enmy".to_string());

        assert_eq!(merger.merge(&first), MergeDecision::Inserted);
        assert_eq!(merger.merge(&second), MergeDecision::Updated);

        let changed = merger.changed();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].ticket_url.as_deref(), Some("https://www.bandsintown.com/e/enmy"));
        assert_eq!(merger.tally(), MergeTally { new: 1, updated: 1, ..Default::default() });
    }

    #[test]
    fn test_row_restored_within_pass_is_not_rewritten() {
        let seen = ymd(2026, 1, 10);
        let body_first = draft("Show Me The Body / Machine Girl", SourceProvenance::ScrapedStructured);
        let girl_first = draft("Machine Girl, Show Me The Body", SourceProvenance::ScrapedStructured);

        let mut stored = CanonicalEvent::from_draft(&body_first, seen);
        stored.display_name = girl_first.display_name.clone();
        let mut merger = EventMerger::new(vec![stored.clone()], MatchThresholds::default(), seen);

        assert_eq!(merger.merge(&body_first), MergeDecision::Updated);
        assert_eq!(merger.merge(&girl_first), MergeDecision::Updated);

        assert!(merger.changed().is_empty());
        assert_eq!(merger.tally(), MergeTally { unchanged: 2, ..Default::default() });
        assert_eq!(merger.get(&stored.identity_key), Some(&stored));
    }

    #[test]
    fn test_missing_key_is_skipped_without_writes() {
        let mut merger = merger();
        let d = draft("ENMY", SourceProvenance::Manual);

        assert_eq!(merger.apply("earl|2026-01-23|nosuchrow", &d), MergeDecision::Ignored);
        assert!(merger.changed().is_empty());
        assert!(merger.is_empty());
    }
}
