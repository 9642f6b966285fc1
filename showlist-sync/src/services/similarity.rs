//! Show name similarity
//!
//! Two cleaned names describe the same show when the token set of the
//! shorter one is (nearly) contained in the other's, which covers billing
//! order changes (`"Show Me The Body / Machine Girl"` vs `"Machine Girl,
//! Show Me The Body"`) and added support acts. Near-identical spellings of a
//! single act fall back to Jaro-Winkler on the joined tokens.

use std::collections::BTreeSet;

/// Filler words ignored when comparing names
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "with", "w", "feat", "ft", "featuring", "presents", "plus", "live",
];

/// Match thresholds, both in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    /// Minimum `|A ∩ B| / min(|A|, |B|)`
    pub containment: f64,
    /// Minimum Jaro-Winkler similarity of the joined token strings
    pub fuzzy: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            containment: 0.8,
            fuzzy: 0.93,
        }
    }
}

/// Lowercase alphanumeric words of `name`, minus stop words
pub fn name_tokens(name: &str) -> BTreeSet<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

/// Share of the smaller token set found in the larger one
pub fn containment(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / smaller as f64
}

/// True when two cleaned names plausibly describe the same show
pub fn names_match(a: &str, b: &str, thresholds: &MatchThresholds) -> bool {
    let tokens_a = name_tokens(a);
    let tokens_b = name_tokens(b);

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return false;
    }

    if containment(&tokens_a, &tokens_b) >= thresholds.containment {
        return true;
    }

    let joined_a = tokens_a.iter().cloned().collect::<Vec<_>>().join(" ");
    let joined_b = tokens_b.iter().cloned().collect::<Vec<_>>().join(" ");
    strsim::jaro_winkler(&joined_a, &joined_b) >= thresholds.fuzzy
}
