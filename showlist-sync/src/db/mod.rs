//! Database access for the sync pipeline
//!
//! Schema creation lives in `showlist_common::db`; this module holds the
//! queries.

pub mod events;
pub mod lock;
pub mod runs;

pub use lock::LockAttempt;
pub use runs::{RunStatus, SyncRun};
