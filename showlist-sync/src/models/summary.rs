//! Per-pass sync statistics

use serde::{Deserialize, Serialize};

/// Counts reported at the end of one orchestration pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    /// Raw candidates returned by all adapters
    pub fetched: usize,
    /// Rows inserted
    pub new: usize,
    /// Rows whose fields changed
    pub updated: usize,
    /// Matches that changed nothing
    pub unchanged: usize,
    /// Matches skipped because the stored row has higher precedence
    pub ignored: usize,
    /// Candidates discarded by the normalizer
    pub dropped: usize,
    /// Derived-key clashes between different shows, left for manual review
    pub collisions: usize,
    /// Rows removed by the retention sweep
    pub deleted: usize,
    /// Adapters that failed closed this pass
    pub failed_sources: Vec<String>,
}

impl SyncSummary {
    pub fn display_string(&self) -> String {
        let mut line = format!(
            "+{} new, ~{} updated, ={} unchanged, {} ignored, {} dropped, {} collisions, -{} deleted",
            self.new,
            self.updated,
            self.unchanged,
            self.ignored,
            self.dropped,
            self.collisions,
            self.deleted
        );
        if !self.failed_sources.is_empty() {
            line.push_str(&format!(" (failed sources: {})", self.failed_sources.join(", ")));
        }
        line
    }
}
