//! Rule store handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{engine_error, AppError, AppState};
use sift_core::{
    classify, ClassificationResult, ClassifySignals, ExpenseType, NewRule, PatternKind, Rule,
};

/// Rule listing with the store revision it was read at
#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub revision: i64,
    pub count: usize,
    pub rules: Vec<Rule>,
}

/// GET /expense-classification/rules
pub async fn list_rules(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RulesResponse>, AppError> {
    let snapshot = state.db.rule_snapshot().map_err(engine_error)?;

    Ok(Json(RulesResponse {
        revision: snapshot.revision,
        count: snapshot.rules.len(),
        rules: snapshot.rules,
    }))
}

/// Request body for creating a rule
#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub name: Option<String>,
    pub type_label: String,
    /// keyword (default), merchant_exact, or merchant_fuzzy
    pub pattern_kind: Option<String>,
    pub pattern: String,
    pub weight: f64,
}

/// POST /expense-classification/rules
pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRuleRequest>,
) -> Result<Json<Rule>, AppError> {
    let type_label: ExpenseType = body
        .type_label
        .parse()
        .map_err(|_| AppError::bad_request(&format!("Invalid type_label: {}", body.type_label)))?;

    let pattern_kind: PatternKind = match body.pattern_kind.as_deref() {
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::bad_request(&format!("Invalid pattern_kind: {}", raw)))?,
        None => PatternKind::Keyword,
    };

    if !(0.0..=1.0).contains(&body.weight) {
        return Err(AppError::bad_request("weight must be in [0, 1]"));
    }
    if body.pattern.trim().is_empty() {
        return Err(AppError::bad_request("pattern must not be empty"));
    }

    let new_rule = NewRule {
        name: body
            .name
            .unwrap_or_else(|| format!("custom: {}", body.pattern)),
        type_label,
        pattern_kind,
        pattern: body.pattern,
        weight: body.weight,
    };

    let id = state.db.insert_rule(&new_rule).map_err(engine_error)?;
    let rule = state
        .db
        .get_rule(id)
        .map_err(engine_error)?
        .ok_or_else(|| AppError::internal("Failed to retrieve created rule"))?;

    info!(rule_id = id, pattern = %rule.pattern, "Rule created");

    Ok(Json(rule))
}

/// Request body for a dry-run classification
#[derive(Debug, Deserialize)]
pub struct TestRulesRequest {
    pub label: String,
    /// Defaults to an expense amount; the dry run never persists anything
    pub amount: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// POST /expense-classification/rules/test
pub async fn test_rules(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TestRulesRequest>,
) -> Result<Json<ClassificationResult>, AppError> {
    let snapshot = state.db.rule_snapshot().map_err(engine_error)?;

    let signals = ClassifySignals {
        label: &body.label,
        amount: body.amount.unwrap_or(-1.0),
        tags: &body.tags,
    };

    Ok(Json(classify(&signals, &snapshot, &state.engine)))
}
