//! Data models for the sync pipeline

pub mod candidate;
pub mod event;
pub mod provenance;
pub mod summary;

pub use candidate::{RawCandidate, SourceTag, TaggedCandidate};
pub use event::{CanonicalEvent, EventDraft, KeyKind};
pub use provenance::SourceProvenance;
pub use summary::SyncSummary;
