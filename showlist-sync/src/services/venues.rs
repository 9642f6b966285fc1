//! Venue canonicalization
//!
//! Sources spell one room many ways ("The EARL", "EARL", "the earl ").
//! Every spelling reduces to a venue key (lowercase alphanumeric words with
//! a leading "the" dropped); registered keys map to one display name.

use showlist_common::config::VenueConfig;
use std::collections::HashMap;

/// Normalized venue key used for matching and identity keys
///
/// `"The EARL"` -> `"earl"`, `"Terminal West @ King Plow"` -> `"terminalwestkingplow"`
pub fn venue_key(name: &str) -> String {
    let words: Vec<String> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();

    let words = match words.split_first() {
        Some((first, rest)) if first == "the" && !rest.is_empty() => rest,
        _ => &words[..],
    };

    words.concat()
}

/// Trimmed, whitespace-collapsed spelling
fn tidy(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Known venues by key
#[derive(Debug, Clone, Default)]
pub struct VenueCatalog {
    by_key: HashMap<String, String>,
}

impl VenueCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded from configured venues and the venues of page sources
    ///
    /// Configured names win over page-source spellings of the same key.
    pub fn from_config<'a>(venues: &[VenueConfig], source_venues: impl IntoIterator<Item = &'a str>) -> Self {
        let mut catalog = Self::new();
        for venue in venues {
            catalog.register(&venue.name, &venue.aliases);
        }
        for venue in source_venues {
            catalog.register(venue, &[]);
        }
        catalog
    }

    /// Register a display name and its aliases
    ///
    /// The first registration of a key keeps its display name.
    pub fn register(&mut self, display_name: &str, aliases: &[String]) {
        let display_name = tidy(display_name);
        if display_name.is_empty() {
            return;
        }

        for spelling in std::iter::once(display_name.as_str()).chain(aliases.iter().map(String::as_str)) {
            let key = venue_key(spelling);
            if key.is_empty() {
                continue;
            }
            self.by_key.entry(key).or_insert_with(|| display_name.clone());
        }
    }

    /// Canonical display name and key for a raw spelling
    ///
    /// Unknown venues keep their tidied spelling. Returns `None` for names
    /// with no alphanumeric content.
    pub fn canonicalize(&self, raw: &str) -> Option<(String, String)> {
        let key = venue_key(raw);
        if key.is_empty() {
            return None;
        }

        match self.by_key.get(&key) {
            Some(display_name) => Some((display_name.clone(), venue_key(display_name))),
            None => Some((tidy(raw), key)),
        }
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
