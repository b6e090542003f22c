//! Classification handlers: suggestions, decisions, pending queue, learning

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{engine_error, AppError, AppState, MAX_PAGE_LIMIT};
use sift_core::{
    ClassificationResult, ClassificationService, Decision, ExpenseType, FeedbackLearner,
    ImproveOutcome, PendingClassification, PendingStats, Transaction,
};

/// Response for an AI suggestion request
#[derive(Debug, Serialize)]
pub struct AiSuggestionResponse {
    pub transaction_id: i64,
    /// The classification currently on the transaction, if any
    pub current_classification: Option<ExpenseType>,
    /// How many stored transactions share this label
    pub historical_transactions: i64,
    pub suggestion: ClassificationResult,
}

/// GET /expense-classification/transactions/:id/ai-suggestion
pub async fn get_ai_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<AiSuggestionResponse>, AppError> {
    let service = ClassificationService::new(&state.db, &state.engine);

    let suggestion = service.get_suggestion(id).map_err(engine_error)?;

    let tx = state
        .db
        .get_transaction(id)
        .map_err(engine_error)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    let historical = state
        .db
        .count_with_description(&tx.description)
        .map_err(engine_error)?;

    Ok(Json(AiSuggestionResponse {
        transaction_id: id,
        current_classification: tx.expense_type,
        historical_transactions: historical,
        suggestion,
    }))
}

/// Request body for recording a classification decision
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    /// Explicit class; absent means "follow the AI suggestion"
    pub expense_type: Option<String>,
    /// Whether a human explicitly reviewed this decision
    #[serde(default)]
    pub user_feedback: bool,
    /// Explicitly overriding the AI suggestion
    #[serde(default)]
    pub override_ai: bool,
}

/// Response for a recorded decision
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub transaction: Transaction,
    /// The suggestion snapshot the decision was resolved against
    pub suggestion: ClassificationResult,
}

/// POST /expense-classification/transactions/:id/classify
pub async fn classify_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let decision = match body.expense_type.as_deref() {
        Some(raw) => match raw.parse::<ExpenseType>() {
            Ok(ExpenseType::Fixed) => Decision::Fixed,
            Ok(ExpenseType::Variable) => Decision::Variable,
            Err(_) => {
                return Err(AppError::bad_request(&format!(
                    "Invalid expense_type: {}",
                    raw
                )))
            }
        },
        None if body.override_ai => {
            return Err(AppError::bad_request(
                "override_ai requires an expense_type to apply",
            ))
        }
        None => Decision::AiSuggestion,
    };

    let service = ClassificationService::new(&state.db, &state.engine);
    let suggestion = service.get_suggestion(id).map_err(engine_error)?;
    let transaction = service
        .record_decision(id, decision, &suggestion, body.user_feedback)
        .map_err(engine_error)?;

    info!(
        transaction_id = id,
        decision = decision.as_str(),
        applied = ?transaction.expense_type,
        "Recorded classification decision"
    );

    Ok(Json(ClassifyResponse {
        transaction,
        suggestion,
    }))
}

/// Query parameters for the pending-classification listing
#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub month: Option<String>,
    /// Max results (default: 100)
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// When false, widen to already-classified expenses (review mode)
    #[serde(default = "default_true")]
    pub only_unclassified: bool,
    pub min_confidence: Option<f64>,
}

fn default_limit() -> i64 {
    100
}

fn default_true() -> bool {
    true
}

/// Pending listing plus aggregate stats by confidence band
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub items: Vec<PendingClassification>,
    pub stats: PendingStats,
}

/// GET /expense-classification/transactions/pending-classification
pub async fn pending_classification(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PendingQuery>,
) -> Result<Json<PendingResponse>, AppError> {
    let month = params
        .month
        .as_deref()
        .ok_or_else(|| AppError::bad_request("month query parameter is required"))?;

    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT) as usize;
    let service = ClassificationService::new(&state.db, &state.engine);

    let items = if params.only_unclassified {
        service
            .list_pending(month, Some(limit), params.min_confidence)
            .map_err(engine_error)?
    } else {
        review_listing(&state, &service, month, limit, params.min_confidence)?
    };

    let stats = ClassificationService::pending_stats(&items);

    Ok(Json(PendingResponse { items, stats }))
}

/// Review mode: every expense for the month, classified or not, paired with
/// a fresh suggestion in the same needs-attention order.
fn review_listing(
    state: &AppState,
    service: &ClassificationService,
    month: &str,
    limit: usize,
    min_confidence: Option<f64>,
) -> Result<Vec<PendingClassification>, AppError> {
    sift_core::validate_month(month).map_err(engine_error)?;

    let mut items: Vec<PendingClassification> = Vec::new();
    for tx in state.db.list_expenses(month).map_err(engine_error)? {
        let suggestion = service.suggest(&tx).map_err(engine_error)?;
        let passes = match min_confidence {
            Some(min) => suggestion.confidence_score >= min,
            None => true,
        };
        if passes {
            items.push(PendingClassification {
                transaction: tx,
                suggestion,
            });
        }
    }

    items.sort_by(|a, b| {
        a.suggestion
            .confidence_score
            .partial_cmp(&b.suggestion.confidence_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.transaction.id.cmp(&b.transaction.id))
    });
    items.truncate(limit);

    Ok(items)
}

/// Request body scoping a feedback learning pass
#[derive(Debug, Deserialize, Default)]
pub struct ImproveRequest {
    /// Bound the event window (oldest first); absent drains the backlog
    #[serde(default)]
    pub max_events: Option<i64>,
}

/// POST /expense-classification/ai/improve-classification
pub async fn improve_classification(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ImproveRequest>>,
) -> Result<Json<ImproveOutcome>, AppError> {
    let max_events = body.and_then(|b| b.max_events);

    let learner = FeedbackLearner::new(&state.db, &state.engine);
    let outcome = learner.improve(max_events).map_err(engine_error)?;

    info!(
        rules_adjusted = outcome.rules_adjusted,
        events_processed = outcome.events_processed,
        net_weight_delta = outcome.net_weight_delta,
        "Feedback learning pass finished"
    );

    Ok(Json(outcome))
}
