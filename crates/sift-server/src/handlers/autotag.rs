//! Auto-tag job handlers
//!
//! `start` returns immediately; the run itself happens in a spawned task
//! writing its progress through the persisted job row. Poll the progress
//! endpoint to follow along.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{engine_error, AppError, AppState};
use sift_core::{AutoTagJob, AutoTagger, JobStatus};

/// Request body for starting an auto-tag run
#[derive(Debug, Deserialize)]
pub struct StartAutoTagRequest {
    pub month: String,
    /// Override the configured auto-apply threshold
    pub confidence_threshold: Option<f64>,
}

/// Response for an auto-tag start (async)
#[derive(Debug, Serialize)]
pub struct StartAutoTagResponse {
    pub job: AutoTagJob,
    pub message: String,
}

/// POST /expense-classification/auto-tag
pub async fn start_auto_tag(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartAutoTagRequest>,
) -> Result<Json<StartAutoTagResponse>, AppError> {
    let tagger = AutoTagger::new(state.db.clone(), state.engine.clone());
    let job = tagger
        .start(&body.month, body.confidence_threshold)
        .map_err(engine_error)?;

    let flag = state.jobs.register(job.id);
    let registry = state.jobs.clone();
    let job_id = job.id;

    tokio::spawn(async move {
        if let Err(e) = tagger.run(job_id, &flag) {
            error!(job_id, "Auto-tag job failed: {}", e);
        }
        registry.remove(job_id);
    });

    info!(job_id, month = %body.month, "Auto-tag job spawned");

    Ok(Json(StartAutoTagResponse {
        job,
        message: "Auto-tag started. Poll GET /expense-classification/auto-tag/:id for progress."
            .to_string(),
    }))
}

/// Progress for a job, derived from the persisted row
#[derive(Debug, Serialize)]
pub struct AutoTagProgressResponse {
    pub job: AutoTagJob,
    pub percent: f64,
}

/// GET /expense-classification/auto-tag/:id
pub async fn get_auto_tag_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<AutoTagProgressResponse>, AppError> {
    let job = state
        .db
        .get_auto_tag_job(id)
        .map_err(engine_error)?
        .ok_or_else(|| AppError::not_found("Auto-tag job not found"))?;

    let percent = if job.total > 0 {
        job.processed as f64 / job.total as f64 * 100.0
    } else {
        100.0
    };

    Ok(Json(AutoTagProgressResponse { job, percent }))
}

/// Response for a cancellation request
#[derive(Debug, Serialize)]
pub struct CancelAutoTagResponse {
    pub cancelled: bool,
    pub message: String,
}

/// POST /expense-classification/auto-tag/:id/cancel
///
/// Cooperative: sets the job's cancellation flag, observed at the next item
/// boundary. Already-applied classifications are not rolled back.
pub async fn cancel_auto_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CancelAutoTagResponse>, AppError> {
    let job = state
        .db
        .get_auto_tag_job(id)
        .map_err(engine_error)?
        .ok_or_else(|| AppError::not_found("Auto-tag job not found"))?;

    if job.status != JobStatus::Running {
        return Ok(Json(CancelAutoTagResponse {
            cancelled: false,
            message: format!("Job is {}, nothing to cancel", job.status.as_str()),
        }));
    }

    if state.jobs.request_cancel(id) {
        info!(job_id = id, "Auto-tag job cancellation requested");
        Ok(Json(CancelAutoTagResponse {
            cancelled: true,
            message: "Cancellation requested; already-applied classifications are kept"
                .to_string(),
        }))
    } else {
        // Running in the database but not live here: a previous process
        // died mid-run. Startup recovery will fail it over.
        Ok(Json(CancelAutoTagResponse {
            cancelled: false,
            message: "Job is not live in this process".to_string(),
        }))
    }
}
