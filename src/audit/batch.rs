//! Batch and sequential entry points.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{info, warn};
use serde::Serialize;

use super::progress::{BatchCollector, Stage};
use super::AuditEngine;
use crate::app::log_progress;
use crate::error_handling::AuditError;
use crate::initialization::init_semaphore;
use crate::models::{AuditOutcome, AuditStatus, CommercialTag};

/// Log batch progress every N finished audits.
const PROGRESS_LOG_EVERY: usize = 10;

/// Lead whose audit returned an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub lead_id: i64,
    pub error: String,
    /// Last stage reported before the failure
    pub last_stage: Option<Stage>,
}

/// Summary of a batch or sequential run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total: usize,
    pub completed: usize,
    pub no_website: usize,
    pub failed: usize,
    pub tag_counts: BTreeMap<CommercialTag, usize>,
    pub outcomes: Vec<AuditOutcome>,
    pub failures: Vec<BatchFailure>,
    pub elapsed_seconds: f64,
}

impl BatchReport {
    fn record(&mut self, lead_id: i64, result: Result<AuditOutcome, AuditError>, last_stage: Option<Stage>) {
        match result {
            Ok(outcome) => {
                match outcome.status {
                    AuditStatus::NoWebsite => self.no_website += 1,
                    _ => self.completed += 1,
                }
                if let Some(tag) = outcome.commercial_tag {
                    *self.tag_counts.entry(tag).or_insert(0) += 1;
                }
                self.outcomes.push(outcome);
            }
            Err(e) => {
                warn!("Lead {lead_id}: {e}");
                self.failed += 1;
                self.failures.push(BatchFailure {
                    lead_id,
                    error: e.to_string(),
                    last_stage,
                });
            }
        }
    }
}

impl AuditEngine {
    /// Merges explicit ids with the `PENDING` leads of a search, keeping order
    /// and dropping duplicates.
    pub async fn resolve_batch(
        &self,
        lead_ids: Vec<i64>,
        search_id: Option<i64>,
    ) -> Result<Vec<i64>, AuditError> {
        let mut ids = lead_ids;
        if let Some(search_id) = search_id {
            let pending = self.store.pending_leads(search_id).await?;
            info!("Search {search_id}: {} pending lead(s)", pending.len());
            ids.extend(pending);
        }
        let mut seen = HashSet::new();
        ids.retain(|id| seen.insert(*id));
        Ok(ids)
    }

    /// Audits leads concurrently, never more than `max_concurrency` at once.
    ///
    /// Each lead goes through the synchronous pipeline; a failing lead is
    /// recorded in the report and does not stop the others.
    pub async fn run_batch(&self, lead_ids: Vec<i64>, max_concurrency: usize) -> BatchReport {
        let start = Instant::now();
        let total = lead_ids.len();
        let semaphore = init_semaphore(max_concurrency);
        let finished = AtomicUsize::new(0);
        let mut report = BatchReport {
            total,
            ..Default::default()
        };
        info!("Starting batch of {total} lead(s), concurrency {}", max_concurrency.max(1));

        let mut tasks = FuturesUnordered::new();
        for lead_id in lead_ids {
            let semaphore = Arc::clone(&semaphore);
            tasks.push(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    let err = AuditError::Internal(anyhow::anyhow!("batch semaphore closed"));
                    return (lead_id, Err(err), None);
                };
                let collector = BatchCollector::new();
                let result = self.run(lead_id, &collector).await;
                (lead_id, result, collector.last_stage())
            });
        }

        while let Some((lead_id, result, last_stage)) = tasks.next().await {
            report.record(lead_id, result, last_stage);
            let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
            if done % PROGRESS_LOG_EVERY == 0 || done == total {
                log_progress(start, &finished, total);
            }
        }

        report.elapsed_seconds = start.elapsed().as_secs_f64();
        report
    }

    /// Audits leads one at a time, pausing `delay` after every audit that
    /// actually contacted a website.
    pub async fn run_sequential(&self, lead_ids: Vec<i64>, delay: Duration) -> BatchReport {
        let start = Instant::now();
        let total = lead_ids.len();
        let finished = AtomicUsize::new(0);
        let mut report = BatchReport {
            total,
            ..Default::default()
        };

        let mut pause_before_next = false;
        for lead_id in lead_ids {
            if pause_before_next && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let collector = BatchCollector::new();
            let result = self.run(lead_id, &collector).await;
            let events = collector.into_events();
            pause_before_next = events.iter().any(|e| e.stage == Stage::Fetch);
            report.record(lead_id, result, events.last().map(|e| e.stage));
            finished.fetch_add(1, Ordering::SeqCst);
            log_progress(start, &finished, total);
        }

        report.elapsed_seconds = start.elapsed().as_secs_f64();
        report
    }
}
