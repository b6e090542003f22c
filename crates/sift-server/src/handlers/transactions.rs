//! Transaction handlers
//!
//! The create endpoint stands in for the external import pipeline so the
//! engine can be exercised end-to-end; statement parsing itself lives
//! outside this service.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{engine_error, AppError, AppState, MAX_PAGE_LIMIT};
use sift_core::{NewTransaction, Transaction, TransactionInsertResult, TransactionSource};

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    pub month: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

/// GET /expense-classification/transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    if let Some(month) = params.month.as_deref() {
        sift_core::validate_month(month).map_err(engine_error)?;
    }

    let limit = params.limit.clamp(1, MAX_PAGE_LIMIT);
    let transactions = state
        .db
        .list_transactions(params.month.as_deref(), limit, params.offset.max(0))
        .map_err(engine_error)?;

    Ok(Json(transactions))
}

/// Request body for creating a transaction
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// YYYY-MM-DD
    pub date: String,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Response for a transaction insert
#[derive(Debug, Serialize)]
pub struct CreateTransactionResponse {
    pub transaction: Transaction,
}

/// POST /expense-classification/transactions
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTransactionRequest>,
) -> Result<Json<CreateTransactionResponse>, AppError> {
    let date = chrono::NaiveDate::parse_from_str(&body.date, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(&format!("Invalid date '{}', expected YYYY-MM-DD", body.date)))?;

    if body.description.trim().is_empty() {
        return Err(AppError::bad_request("description must not be empty"));
    }

    let new_tx = NewTransaction {
        date,
        description: body.description,
        amount: body.amount,
        tags: body.tags,
        source: TransactionSource::Manual,
    };

    let id = match state.db.insert_transaction(&new_tx).map_err(engine_error)? {
        TransactionInsertResult::Inserted(id) => id,
        TransactionInsertResult::Duplicate(existing_id) => {
            return Err(AppError::conflict(&format!(
                "Duplicate of transaction {}",
                existing_id
            )))
        }
    };

    let transaction = state
        .db
        .get_transaction(id)
        .map_err(engine_error)?
        .ok_or_else(|| AppError::internal("Failed to retrieve created transaction"))?;

    Ok(Json(CreateTransactionResponse { transaction }))
}
