//! Transfer link handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, SuccessResponse, API_ACTOR};
use tally_core::models::LinkCandidates;
use tally_core::LinkEngine;

/// GET /api/transactions/:id/linkable - Transfer candidates for a transaction
pub async fn find_linkable(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<LinkCandidates>, AppError> {
    let candidates = LinkEngine::new(&state.db).find_candidates(transaction_id)?;
    Ok(Json(candidates))
}

/// Request body for creating a link
#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub parent_t_id: i64,
    pub child_t_id: i64,
}

/// Response with the canonical stored direction
#[derive(Serialize)]
pub struct LinkResponse {
    pub parent_t_id: i64,
    pub child_t_id: i64,
}

/// POST /api/links - Link two transactions as a transfer pair
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    let (parent_t_id, child_t_id) =
        LinkEngine::new(&state.db).create_link(req.parent_t_id, req.child_t_id)?;

    state.db.log_audit(
        API_ACTOR,
        "link",
        Some("transaction"),
        Some(parent_t_id),
        Some(&format!("child={}", child_t_id)),
    )?;

    Ok(Json(LinkResponse {
        parent_t_id,
        child_t_id,
    }))
}

/// Request body for unlinking
#[derive(Debug, Deserialize)]
pub struct UnlinkRequest {
    pub transaction_id: i64,
    pub linked_t_id: i64,
}

/// POST /api/links/unlink - Remove the link between two transactions
pub async fn unlink(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UnlinkRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    LinkEngine::new(&state.db).unlink(req.transaction_id, req.linked_t_id)?;

    state.db.log_audit(
        API_ACTOR,
        "unlink",
        Some("transaction"),
        Some(req.transaction_id),
        Some(&format!("other={}", req.linked_t_id)),
    )?;

    Ok(Json(SuccessResponse { success: true }))
}
