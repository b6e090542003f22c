//! Auto-tagger: bulk classification of a month's pending expenses
//!
//! State machine per job: Running -> Completed | Cancelled | Failed.
//! The run loop is cooperative: it checks a shared cancellation flag
//! between items, so cancel acknowledges immediately without tearing an
//! in-flight decision. Already-applied classifications are committed,
//! independent decisions and are never rolled back.
//!
//! Progress is persisted after every item; a crash or cancellation leaves
//! the job row describing exactly what happened.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{AutoTagJob, AutoTagOutcome, Decision, JobStatus};
use crate::service::{validate_month, ClassificationService};

/// Cooperative cancellation flag shared between the runner and the
/// cancel endpoint
pub type CancellationFlag = Arc<AtomicBool>;

/// Process-wide registry of cancellation flags for live jobs
#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<Mutex<HashMap<i64, CancellationFlag>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job and hand back its flag
    pub fn register(&self, job_id: i64) -> CancellationFlag {
        let flag = Arc::new(AtomicBool::new(false));
        self.inner.lock().unwrap().insert(job_id, flag.clone());
        flag
    }

    /// Signal cancellation. Returns false when the job is not live in this
    /// process (already finished, or owned by a previous process).
    pub fn request_cancel(&self, job_id: i64) -> bool {
        match self.inner.lock().unwrap().get(&job_id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Drop a finished job's flag
    pub fn remove(&self, job_id: i64) {
        self.inner.lock().unwrap().remove(&job_id);
    }
}

/// Batch driver applying suggestions above a confidence threshold
pub struct AutoTagger {
    db: Database,
    config: EngineConfig,
}

impl AutoTagger {
    pub fn new(db: Database, config: EngineConfig) -> Self {
        Self { db, config }
    }

    /// Create the job row for a month. Fails with `AlreadyRunning` when the
    /// month already has a running job.
    pub fn start(&self, month: &str, confidence_threshold: Option<f64>) -> Result<AutoTagJob> {
        validate_month(month)?;

        let threshold = confidence_threshold.unwrap_or(self.config.auto_apply_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidData(format!(
                "Confidence threshold must be in [0, 1], got {}",
                threshold
            )));
        }

        let total = self.db.count_unclassified(Some(month))?;
        let job = self.db.insert_auto_tag_job(month, threshold, total)?;

        info!(
            job_id = job.id,
            month, threshold, total, "Auto-tag job started"
        );
        Ok(job)
    }

    /// Run a job to a terminal state. Items are processed in the pending
    /// queue's needs-attention order (ascending confidence), so under
    /// cancellation the most ambiguous candidates are the ones left for
    /// manual review.
    pub fn run(&self, job_id: i64, cancel: &CancellationFlag) -> Result<AutoTagOutcome> {
        let job = self
            .db
            .get_auto_tag_job(job_id)?
            .ok_or_else(|| Error::NotFound(format!("Auto-tag job {} not found", job_id)))?;
        if job.status != JobStatus::Running {
            return Err(Error::InvalidData(format!(
                "Auto-tag job {} is {}, not running",
                job_id,
                job.status.as_str()
            )));
        }

        match self.run_inner(&job, cancel) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                // Freeze the tally; the persisted processed count is the
                // resume point for a retry.
                if let Err(finish_err) =
                    self.db
                        .finish_job(job_id, JobStatus::Failed, Some(&e.to_string()))
                {
                    warn!(job_id, error = %finish_err, "Failed to mark auto-tag job failed");
                }
                Err(e)
            }
        }
    }

    fn run_inner(&self, job: &AutoTagJob, cancel: &CancellationFlag) -> Result<AutoTagOutcome> {
        let service = ClassificationService::new(&self.db, &self.config);

        let pending = service.list_pending(&job.month, None, None)?;
        let total = pending.len() as i64;

        let mut processed = 0i64;
        let mut auto_applied = 0i64;
        let mut pending_review = 0i64;

        for item in pending {
            if cancel.load(Ordering::SeqCst) {
                self.db
                    .update_job_counts(job.id, total, processed, auto_applied, pending_review)?;
                self.db.finish_job(job.id, JobStatus::Cancelled, None)?;
                info!(
                    job_id = job.id,
                    processed, auto_applied, "Auto-tag job cancelled"
                );
                return Ok(AutoTagOutcome {
                    status: JobStatus::Cancelled,
                    auto_applied,
                    pending_review,
                    total_analyzed: processed,
                });
            }

            let tx_id = item.transaction.id;

            // Someone may have classified this transaction since the listing;
            // re-read and leave it alone if so.
            let current = self
                .db
                .get_transaction(tx_id)?
                .ok_or_else(|| Error::NotFound(format!("Transaction {} not found", tx_id)))?;

            if current.expense_type.is_some() {
                pending_review += 1;
            } else if item.suggestion.confidence_score >= job.confidence_threshold {
                service.record_decision(tx_id, Decision::AiSuggestion, &item.suggestion, false)?;
                auto_applied += 1;
            } else {
                pending_review += 1;
            }

            processed += 1;
            self.db
                .update_job_counts(job.id, total, processed, auto_applied, pending_review)?;
        }

        self.db.finish_job(job.id, JobStatus::Completed, None)?;
        info!(
            job_id = job.id,
            total, auto_applied, pending_review, "Auto-tag job completed"
        );

        Ok(AutoTagOutcome {
            status: JobStatus::Completed,
            auto_applied,
            pending_review,
            total_analyzed: total,
        })
    }

    /// Current persisted progress for a job
    pub fn progress(&self, job_id: i64) -> Result<AutoTagJob> {
        self.db
            .get_auto_tag_job(job_id)?
            .ok_or_else(|| Error::NotFound(format!("Auto-tag job {} not found", job_id)))
    }
}
