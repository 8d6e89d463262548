//! Tag and transaction-tagging handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse, API_ACTOR};
use tally_core::models::Tag;

/// GET /api/tags - List all tags
pub async fn list_tags(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Tag>>, AppError> {
    let tags = state.db.list_tags()?;
    Ok(Json(tags))
}

/// Request body for creating a tag
#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub label: String,
    pub color: Option<String>,
}

/// POST /api/tags - Create a tag
pub async fn create_tag(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTagRequest>,
) -> Result<Json<Tag>, AppError> {
    if req.label.trim().is_empty() {
        return Err(AppError::bad_request("Tag label must not be empty"));
    }

    let id = state.db.upsert_tag(req.label.trim(), req.color.as_deref())?;

    state.db.log_audit(
        API_ACTOR,
        "create",
        Some("tag"),
        Some(id),
        Some(&format!("label={}", req.label.trim())),
    )?;

    let tag = state
        .db
        .get_tag(id)?
        .ok_or_else(|| AppError::internal("Tag not found after creation"))?;

    Ok(Json(tag))
}

/// GET /api/tags/:id - Get a specific tag
pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Tag>, AppError> {
    let tag = state
        .db
        .get_tag(id)?
        .ok_or_else(|| AppError::not_found("Tag not found"))?;

    Ok(Json(tag))
}

/// DELETE /api/tags/:id - Delete a tag (mappings cascade)
pub async fn delete_tag(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.delete_tag(id)? {
        return Err(AppError::not_found("Tag not found"));
    }

    state
        .db
        .log_audit(API_ACTOR, "delete", Some("tag"), Some(id), None)?;

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/transactions/:id/tags - Active tags on a line item
pub async fn get_transaction_tags(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<Vec<Tag>>, AppError> {
    state
        .db
        .get_line_item(transaction_id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;

    let tags = state.db.tags_for_line_item(transaction_id)?;
    Ok(Json(tags))
}

/// Request body for attaching a tag
#[derive(Debug, Deserialize)]
pub struct AddTagRequest {
    pub tag_id: i64,
}

/// POST /api/transactions/:id/tags - Attach a tag to a line item
pub async fn add_transaction_tag(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<i64>,
    Json(req): Json<AddTagRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .db
        .get_line_item(transaction_id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    state
        .db
        .get_tag(req.tag_id)?
        .ok_or_else(|| AppError::not_found("Tag not found"))?;

    state.db.tag_line_item(transaction_id, req.tag_id)?;

    state.db.log_audit(
        API_ACTOR,
        "tag",
        Some("transaction"),
        Some(transaction_id),
        Some(&format!("tag_id={}", req.tag_id)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/transactions/:tx_id/tags/:tag_id - Detach a tag (soft delete)
pub async fn remove_transaction_tag(
    State(state): State<Arc<AppState>>,
    Path((transaction_id, tag_id)): Path<(i64, i64)>,
) -> Result<Json<SuccessResponse>, AppError> {
    if !state.db.untag_line_item(transaction_id, tag_id)? {
        return Err(AppError::not_found("Tag is not attached to this transaction"));
    }

    state.db.log_audit(
        API_ACTOR,
        "untag",
        Some("transaction"),
        Some(transaction_id),
        Some(&format!("tag_id={}", tag_id)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}
