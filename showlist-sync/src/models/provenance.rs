//! Source provenance and precedence

use serde::{Deserialize, Serialize};
use showlist_common::Error;
use std::fmt;
use std::str::FromStr;

/// Origin type of an event record
///
/// Declaration order is precedence order, lowest first, so the derived
/// `Ord` answers "does this source outrank that one".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceProvenance {
    /// Ticketing discovery API
    Api,
    /// Text scraped from a venue page by date/name proximity
    ScrapedHeuristic,
    /// JSON-LD metadata embedded in a venue page
    ScrapedStructured,
    /// Manually curated override list
    Manual,
}

impl SourceProvenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceProvenance::Api => "api",
            SourceProvenance::ScrapedHeuristic => "scraped_heuristic",
            SourceProvenance::ScrapedStructured => "scraped_structured",
            SourceProvenance::Manual => "manual",
        }
    }
}

impl fmt::Display for SourceProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceProvenance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(SourceProvenance::Api),
            "scraped_heuristic" => Ok(SourceProvenance::ScrapedHeuristic),
            "scraped_structured" => Ok(SourceProvenance::ScrapedStructured),
            "manual" => Ok(SourceProvenance::Manual),
            other => Err(Error::InvalidInput(format!("Unknown provenance: {}", other))),
        }
    }
}
