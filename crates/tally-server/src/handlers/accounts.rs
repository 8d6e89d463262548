//! Account handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse, API_ACTOR};
use tally_core::models::{Account, AccountKind};

/// GET /api/accounts - List all accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = state.db.list_accounts()?;
    Ok(Json(accounts))
}

/// Request body for creating an account
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    #[serde(default = "default_account_kind")]
    pub kind: String,
}

fn default_account_kind() -> String {
    "checking".to_string()
}

/// POST /api/accounts - Create an account
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAccountRequest>,
) -> Result<Json<Account>, AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::bad_request("Account name must not be empty"));
    }

    let kind: AccountKind = req.kind.parse().map_err(|_| {
        AppError::bad_request("Invalid kind. Valid: checking, savings, credit, brokerage")
    })?;

    let id = state.db.upsert_account(req.name.trim(), kind)?;

    state.db.log_audit(
        API_ACTOR,
        "create",
        Some("account"),
        Some(id),
        Some(&format!("name={}", req.name.trim())),
    )?;

    let account = state
        .db
        .get_account(id)?
        .ok_or_else(|| AppError::internal("Account not found after creation"))?;

    Ok(Json(account))
}

/// GET /api/accounts/:id - Get a specific account
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Account>, AppError> {
    let account = state
        .db
        .get_account(id)?
        .ok_or_else(|| AppError::not_found("Account not found"))?;

    Ok(Json(account))
}

/// DELETE /api/accounts/:id - Delete an account and its transactions
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .db
        .get_account(id)?
        .ok_or_else(|| AppError::not_found("Account not found"))?;

    state.db.delete_account(id)?;
    state
        .db
        .log_audit(API_ACTOR, "delete", Some("account"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}
