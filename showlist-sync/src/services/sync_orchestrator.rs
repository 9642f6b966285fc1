//! Sync pass orchestration
//!
//! **Pass:**
//! 1. take the run lock
//! 2. fetch every source concurrently, each under its own timeout
//! 3. normalize candidates, dropping the malformed ones
//! 4. in one transaction: load stored rows, merge drafts in source order,
//!    upsert rows that differ from their loaded state, sweep past events,
//!    commit
//! 5. log the run and release the lock
//!
//! Source failures never abort a pass. A store failure rolls the whole pass
//! back and is returned to the caller.

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::deduplicator::EventMerger;
use super::normalizer::Normalizer;
use super::similarity::MatchThresholds;
use super::venues::VenueCatalog;
use crate::config::SyncSettings;
use crate::db::{events, lock, runs, LockAttempt, RunStatus, SyncRun};
use crate::error::{SyncError, SyncResult};
use crate::models::{EventDraft, SyncSummary, TaggedCandidate};
use crate::sources::{build_sources, PageFetcher, SourceAdapter, SourceFetch};

/// Drives sync passes over a fixed set of sources
pub struct SyncOrchestrator {
    db: SqlitePool,
    sources: Vec<SourceAdapter>,
    normalizer: Normalizer,
    thresholds: MatchThresholds,
    adapter_timeout: Duration,
    lock_stale_after: Duration,
}

impl SyncOrchestrator {
    /// Orchestrator over explicitly built sources
    ///
    /// Sources are merged in the order given.
    pub fn new(db: SqlitePool, sources: Vec<SourceAdapter>, settings: &SyncSettings) -> Self {
        let venues = VenueCatalog::from_config(&settings.venues, sources.iter().filter_map(SourceAdapter::venue));

        Self {
            db,
            sources,
            normalizer: Normalizer::new(venues),
            thresholds: settings.thresholds,
            adapter_timeout: settings.adapter_timeout,
            lock_stale_after: settings.lock_stale_after,
        }
    }

    /// Orchestrator over the sources named in `settings`
    pub fn from_settings(db: SqlitePool, settings: &SyncSettings, fetcher: Arc<dyn PageFetcher>) -> Self {
        let sources = build_sources(settings, fetcher);
        Self::new(db, sources, settings)
    }

    pub fn sources(&self) -> &[SourceAdapter] {
        &self.sources
    }

    /// Run one pass as of `today`
    ///
    /// # Errors
    /// - `RunInProgress` when another pass holds the lock
    /// - `TransactionFailure` when the store write failed; nothing was committed
    pub async fn run_pass(&self, today: NaiveDate) -> SyncResult<SyncSummary> {
        let run_id = Uuid::new_v4();
        let holder = run_id.to_string();

        match lock::try_acquire(&self.db, &holder, self.lock_stale_after)
            .await
            .map_err(SyncError::from_store)?
        {
            LockAttempt::Acquired => {}
            LockAttempt::Held { holder, acquired_at } => {
                tracing::warn!(holder = %holder, since = %acquired_at, "Sync pass already running, skipping");
                return Err(SyncError::RunInProgress(holder));
            }
        }

        tracing::info!(run_id = %run_id, today = %today, sources = self.sources.len(), "Starting sync pass");
        let started_at = Utc::now();

        let result = self.execute_pass(today).await;

        let run = SyncRun {
            run_id,
            started_at,
            finished_at: Utc::now(),
            status: if result.is_ok() { RunStatus::Succeeded } else { RunStatus::Failed },
            summary: result.as_ref().ok().cloned(),
            error: result.as_ref().err().map(ToString::to_string),
        };
        if let Err(e) = runs::record_run(&self.db, &run).await {
            tracing::warn!(run_id = %run_id, error = %e, "Failed to record sync run");
        }

        match lock::release(&self.db, &holder).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(run_id = %run_id, "Run lock was no longer ours at release"),
            Err(e) => tracing::warn!(run_id = %run_id, error = %e, "Failed to release run lock"),
        }

        match &result {
            Ok(summary) => tracing::info!(run_id = %run_id, "Sync pass complete: {}", summary.display_string()),
            Err(e) => tracing::error!(run_id = %run_id, error = %e, "Sync pass failed, nothing committed"),
        }

        result
    }

    async fn execute_pass(&self, today: NaiveDate) -> SyncResult<SyncSummary> {
        let fetches = self.fetch_all().await;

        let mut summary = SyncSummary::default();
        let drafts = self.normalize_all(fetches, today, &mut summary);

        self.commit(&drafts, today, &mut summary).await?;

        Ok(summary)
    }

    /// Fetch every source; results keep source order
    async fn fetch_all(&self) -> Vec<SourceFetch> {
        join_all(
            self.sources
                .iter()
                .map(|source| source.fetch_fail_closed(self.adapter_timeout)),
        )
        .await
    }

    fn normalize_all(&self, fetches: Vec<SourceFetch>, today: NaiveDate, summary: &mut SyncSummary) -> Vec<EventDraft> {
        let mut drafts = Vec::new();

        for fetch in fetches {
            if fetch.failed {
                summary.failed_sources.push(fetch.tag.name.clone());
            }
            summary.fetched += fetch.candidates.len();

            for candidate in fetch.candidates {
                let tagged = TaggedCandidate {
                    tag: fetch.tag.clone(),
                    candidate,
                };
                match self.normalizer.normalize(&tagged, today) {
                    Ok(draft) => drafts.push(draft),
                    Err(e) => {
                        tracing::debug!(source = %tagged.tag.name, error = %e, "Dropped candidate");
                        summary.dropped += 1;
                    }
                }
            }
        }

        drafts
    }

    async fn commit(&self, drafts: &[EventDraft], today: NaiveDate, summary: &mut SyncSummary) -> SyncResult<()> {
        let mut tx = self.db.begin().await.map_err(SyncError::TransactionFailure)?;

        let stored = events::load_all(&mut tx).await.map_err(SyncError::from_store)?;
        let mut merger = EventMerger::new(stored, self.thresholds, today);

        for draft in drafts {
            merger.merge(draft);
        }

        let tally = merger.tally();
        summary.new = tally.new;
        summary.updated = tally.updated;
        summary.unchanged = tally.unchanged;
        summary.ignored = tally.ignored;
        summary.collisions = tally.collisions;

        for event in merger.changed() {
            events::upsert(&mut tx, event).await.map_err(SyncError::from_store)?;
        }

        let deleted = events::sweep_expired(&mut tx, today)
            .await
            .map_err(SyncError::from_store)?;
        summary.deleted = deleted as usize;

        tx.commit().await.map_err(SyncError::TransactionFailure)?;

        Ok(())
    }
}
