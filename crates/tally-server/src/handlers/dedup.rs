//! Duplicate detection and merge handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState, API_ACTOR};
use tally_core::models::{DuplicateScan, MergeInstruction, MergeOutcome};
use tally_core::DedupEngine;

/// Query parameters for the duplicate scan
#[derive(Debug, Deserialize)]
pub struct FindDuplicatesQuery {
    /// Restrict the scan to one calendar year
    pub year: Option<i32>,
}

/// GET /api/accounts/:id/duplicates - Scan an account for duplicate groups
pub async fn find_duplicates(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<i64>,
    Query(params): Query<FindDuplicatesQuery>,
) -> Result<Json<DuplicateScan>, AppError> {
    let scan = DedupEngine::new(&state.db).find_duplicates(account_id, params.year)?;

    // The scan memoizes cleared rows, so it counts as a mutation
    state.db.log_audit(
        API_ACTOR,
        "dedup_scan",
        Some("account"),
        Some(account_id),
        Some(&format!(
            "groups={}, marked={}",
            scan.total, scan.marked_as_non_duplicate
        )),
    )?;

    Ok(Json(scan))
}

/// Request body for applying merges
#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub merges: Vec<MergeInstruction>,
}

/// POST /api/accounts/:id/duplicates/merge - Apply user-confirmed merges
pub async fn merge_duplicates(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<i64>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeOutcome>, AppError> {
    if req.merges.is_empty() {
        return Err(AppError::bad_request("No merge instructions provided"));
    }

    let outcome = DedupEngine::new(&state.db).merge_duplicates(account_id, &req.merges)?;

    state.db.log_audit(
        API_ACTOR,
        "merge",
        Some("account"),
        Some(account_id),
        Some(&format!(
            "merged={}, tags_added={}",
            outcome.merged_count, outcome.tags_added
        )),
    )?;

    Ok(Json(outcome))
}
