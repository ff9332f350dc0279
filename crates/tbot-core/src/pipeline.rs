//! Fetch → filter → dedup → format.
//!
//! One `TenderPipeline` is shared by the `/tenders` command and the periodic
//! scheduler. Whole runs are serialized behind `run_lock`, so the seen-set is
//! never updated by two walks at once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    dedup::SeenSet,
    filter::FilterCriteria,
    formatting::TenderFormatter,
    pagination::{PageWalker, WalkEnd, WalkSettings},
    ports::TenderSource,
    tender::TenderRecord,
};

/// Counters for one run, shown by `/status`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub pages: usize,
    pub listed: usize,
    pub skipped_seen: usize,
    pub detail_failures: usize,
    pub accepted: usize,
    pub end: WalkEnd,
}

#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub tenders: Vec<TenderRecord>,
    pub summary: RunSummary,
}

pub struct TenderPipeline {
    source: Arc<dyn TenderSource>,
    criteria: FilterCriteria,
    walk: WalkSettings,
    formatter: TenderFormatter,
    seen: Mutex<SeenSet>,
    run_lock: Mutex<()>,
    last_run: Mutex<Option<RunSummary>>,
}

impl TenderPipeline {
    pub fn new(
        source: Arc<dyn TenderSource>,
        criteria: FilterCriteria,
        walk: WalkSettings,
        formatter: TenderFormatter,
    ) -> Self {
        Self {
            source,
            criteria,
            walk,
            formatter,
            seen: Mutex::new(SeenSet::new()),
            run_lock: Mutex::new(()),
            last_run: Mutex::new(None),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn formatter(&self) -> &TenderFormatter {
        &self.formatter
    }

    /// Walk the listing and return tenders that pass the filter and were not
    /// returned by any earlier run. Accepted ids are marked seen immediately.
    pub async fn search(&self) -> SearchOutcome {
        let _run = self.run_lock.lock().await;

        let mut summary = RunSummary {
            started_at: Utc::now(),
            pages: 0,
            listed: 0,
            skipped_seen: 0,
            detail_failures: 0,
            accepted: 0,
            end: WalkEnd::Exhausted,
        };
        let mut tenders = Vec::new();

        let mut walker = PageWalker::new(self.source.as_ref(), self.walk);
        while let Some(batch) = walker.next_batch().await {
            for entry in batch {
                summary.listed += 1;
                if entry.id.is_empty() {
                    continue;
                }
                if !self.seen.lock().await.is_new(&entry.id) {
                    summary.skipped_seen += 1;
                    continue;
                }

                let record = match self.source.fetch_tender(&entry.id).await {
                    Ok(r) => r,
                    Err(e) => {
                        summary.detail_failures += 1;
                        tracing::warn!(tender_id = %entry.id, error = %e, "failed to fetch tender details");
                        continue;
                    }
                };

                if let Err(reason) = self.criteria.evaluate(&record) {
                    tracing::debug!(tender_id = %entry.id, %reason, "tender rejected");
                    continue;
                }

                // Listing may repeat an id across pages.
                if !self.seen.lock().await.mark_seen(entry.id.clone()) {
                    continue;
                }
                tracing::info!(tender_id = %entry.id, "tender accepted");
                tenders.push(record);
            }
        }

        summary.pages = walker.pages_fetched();
        summary.accepted = tenders.len();
        if let Some(end) = walker.end() {
            summary.end = end.clone();
        }

        tracing::info!(
            pages = summary.pages,
            listed = summary.listed,
            skipped_seen = summary.skipped_seen,
            accepted = summary.accepted,
            "search finished"
        );
        *self.last_run.lock().await = Some(summary.clone());

        SearchOutcome { tenders, summary }
    }

    pub async fn seen_count(&self) -> usize {
        self.seen.lock().await.len()
    }

    pub async fn is_seen(&self, id: &str) -> bool {
        !self.seen.lock().await.is_new(id)
    }

    /// Forget every delivered id. Waits for a running search to finish.
    pub async fn reset_seen(&self) {
        let _run = self.run_lock.lock().await;
        self.seen.lock().await.clear();
    }

    pub async fn last_run(&self) -> Option<RunSummary> {
        self.last_run.lock().await.clone()
    }
}
