//! Transaction (line item) handlers and statement import

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, SuccessResponse, API_ACTOR, MAX_PAGE_LIMIT};
use tally_core::import::parse_statement_csv;
use tally_core::models::{LineItem, NewLineItem};

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    pub account_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/transactions - List line items
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<LineItem>>, AppError> {
    let limit = params.limit.unwrap_or(100).clamp(1, MAX_PAGE_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let items = state.db.list_line_items(params.account_id, limit, offset)?;
    Ok(Json(items))
}

/// Request body for manual line item entry
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    pub account_id: i64,
    /// Calendar date, YYYY-MM-DD
    pub date: String,
    pub amount: f64,
    pub quantity: Option<f64>,
    pub symbol: Option<String>,
    pub balance_after: Option<f64>,
    pub description: Option<String>,
    pub memo: Option<String>,
}

/// POST /api/transactions - Create a line item manually
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<Json<LineItem>, AppError> {
    let date = chrono::NaiveDate::parse_from_str(&req.date, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("Invalid date format (use YYYY-MM-DD)"))?;

    state
        .db
        .get_account(req.account_id)?
        .ok_or_else(|| AppError::not_found("Account not found"))?;

    let item = NewLineItem {
        date,
        quantity: req.quantity,
        amount: req.amount,
        symbol: req.symbol,
        balance_after: req.balance_after,
        description: req.description,
        memo: req.memo,
    };

    let id = state.db.insert_line_item(req.account_id, &item)?;

    state.db.log_audit(
        API_ACTOR,
        "create",
        Some("transaction"),
        Some(id),
        Some(&format!("account={}, amount={:.2}", req.account_id, req.amount)),
    )?;

    let created = state
        .db
        .get_line_item(id)?
        .ok_or_else(|| AppError::internal("Transaction not found after creation"))?;

    Ok(Json(created))
}

/// GET /api/transactions/:id - Get a specific line item
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<LineItem>, AppError> {
    let item = state
        .db
        .get_line_item(id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;

    Ok(Json(item))
}

/// DELETE /api/transactions/:id - Delete a line item
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_line_item(id)? {
        return Err(AppError::not_found("Transaction not found"));
    }

    state
        .db
        .log_audit(API_ACTOR, "delete", Some("transaction"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Request body for statement import
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub account_id: i64,
    /// Statement CSV content (header row required)
    pub csv_data: String,
}

/// Response for statement import
#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub account_name: String,
}

/// POST /api/import - Import line items from statement CSV
pub async fn import_statement(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let account = state
        .db
        .get_account(req.account_id)?
        .ok_or_else(|| AppError::not_found("Account not found"))?;

    let items = parse_statement_csv(req.csv_data.as_bytes())?;
    let imported = state.db.insert_line_items(req.account_id, &items)?;

    state.db.log_audit(
        API_ACTOR,
        "import",
        Some("account"),
        Some(req.account_id),
        Some(&format!("imported={}", imported)),
    )?;

    Ok(Json(ImportResponse {
        imported,
        account_name: account.name,
    }))
}
