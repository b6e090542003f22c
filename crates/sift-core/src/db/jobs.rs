//! Auto-tag job persistence
//!
//! Job state lives in the database so the progress endpoint reflects the
//! last committed state even across process restarts. The partial unique
//! index on (month, status='running') enforces the
//! at-most-one-active-job-per-month invariant at the storage layer.

use rusqlite::{params, OptionalExtension, Row};
use tracing::warn;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{AutoTagJob, JobStatus};

fn map_job(row: &Row) -> rusqlite::Result<AutoTagJob> {
    let status_str: String = row.get(2)?;
    let started_at_str: String = row.get(9)?;
    let finished_at_str: Option<String> = row.get(10)?;

    Ok(AutoTagJob {
        id: row.get(0)?,
        month: row.get(1)?,
        status: status_str.parse().unwrap_or(JobStatus::Failed),
        confidence_threshold: row.get(3)?,
        total: row.get(4)?,
        processed: row.get(5)?,
        auto_applied: row.get(6)?,
        pending_review: row.get(7)?,
        error: row.get(8)?,
        started_at: parse_datetime(&started_at_str),
        finished_at: finished_at_str.map(|s| parse_datetime(&s)),
    })
}

const JOB_COLUMNS: &str = "id, month, status, confidence_threshold, total, processed, \
     auto_applied, pending_review, error, started_at, finished_at";

impl Database {
    /// Create a running job row. Fails with `AlreadyRunning` if the month
    /// already has one (checked up front, enforced by the unique index).
    pub fn insert_auto_tag_job(
        &self,
        month: &str,
        confidence_threshold: f64,
        total: i64,
    ) -> Result<AutoTagJob> {
        let conn = self.conn()?;

        let result = conn.execute(
            r#"
            INSERT INTO auto_tag_jobs (month, status, confidence_threshold, total)
            VALUES (?, 'running', ?, ?)
            "#,
            params![month, confidence_threshold, total],
        );

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(Error::AlreadyRunning(format!(
                    "Auto-tag job already running for {}",
                    month
                )));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        self.get_auto_tag_job(id)?
            .ok_or_else(|| Error::NotFound(format!("Auto-tag job {} not found", id)))
    }

    pub fn get_auto_tag_job(&self, id: i64) -> Result<Option<AutoTagJob>> {
        let conn = self.conn()?;

        let job = conn
            .query_row(
                &format!("SELECT {} FROM auto_tag_jobs WHERE id = ?", JOB_COLUMNS),
                params![id],
                map_job,
            )
            .optional()?;

        Ok(job)
    }

    /// The currently running job for a month, if any
    pub fn running_job_for_month(&self, month: &str) -> Result<Option<AutoTagJob>> {
        let conn = self.conn()?;

        let job = conn
            .query_row(
                &format!(
                    "SELECT {} FROM auto_tag_jobs WHERE month = ? AND status = 'running'",
                    JOB_COLUMNS
                ),
                params![month],
                map_job,
            )
            .optional()?;

        Ok(job)
    }

    /// Persist the high-water mark after each processed item
    pub fn update_job_counts(
        &self,
        id: i64,
        total: i64,
        processed: i64,
        auto_applied: i64,
        pending_review: i64,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE auto_tag_jobs
             SET total = ?, processed = ?, auto_applied = ?, pending_review = ?
             WHERE id = ?",
            params![total, processed, auto_applied, pending_review, id],
        )?;
        Ok(())
    }

    /// Transition a job to a terminal state, freezing its tally
    pub fn finish_job(&self, id: i64, status: JobStatus, error: Option<&str>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE auto_tag_jobs
             SET status = ?, error = ?, finished_at = CURRENT_TIMESTAMP
             WHERE id = ?",
            params![status.as_str(), error, id],
        )?;
        Ok(())
    }

    pub fn list_auto_tag_jobs(&self, limit: i64) -> Result<Vec<AutoTagJob>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM auto_tag_jobs ORDER BY id DESC LIMIT ?",
            JOB_COLUMNS
        ))?;

        let jobs = stmt
            .query_map(params![limit], map_job)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(jobs)
    }

    /// Fail over jobs left running by a dead process. Called at startup;
    /// the persisted processed count stays available for resumption.
    pub fn recover_interrupted_jobs(&self) -> Result<usize> {
        let conn = self.conn()?;
        let recovered = conn.execute(
            "UPDATE auto_tag_jobs
             SET status = 'failed', error = 'interrupted by restart', finished_at = CURRENT_TIMESTAMP
             WHERE status = 'running'",
            [],
        )?;

        if recovered > 0 {
            warn!("Recovered {} interrupted auto-tag job(s)", recovered);
        }
        Ok(recovered)
    }
}
