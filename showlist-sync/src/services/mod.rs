//! Pipeline services: normalization, matching, merging and orchestration

pub mod dates;
pub mod deduplicator;
pub mod normalizer;
pub mod similarity;
pub mod sync_orchestrator;
pub mod venues;

pub use deduplicator::{EventMerger, MergeDecision, MergeTally};
pub use normalizer::Normalizer;
pub use similarity::MatchThresholds;
pub use sync_orchestrator::SyncOrchestrator;
pub use venues::VenueCatalog;
