//! Inspection endpoints for operators.

use crate::auth::require_service;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, Request, State};
use courier_core::{ObjectSummary, SubmissionStatus};
use courier_metadata::ListQuery;
use courier_metadata::models::SubmissionRow;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Cap on page size for listings.
const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub owner: Option<String>,
    pub status: Option<String>,
    pub created_before: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Wire view of a submission row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub owner: String,
    pub id: String,
    pub sdes_correlation_id: String,
    pub status: SubmissionStatus,
    pub object_summary: ObjectSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub failure_count: i64,
    pub locked: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
}

impl SubmissionView {
    fn from_row(row: SubmissionRow) -> ApiResult<Self> {
        let status = row
            .status()
            .map_err(|e| ApiError::Internal(format!("corrupt status column: {e}")))?;
        Ok(Self {
            status,
            object_summary: row.object_summary(),
            owner: row.owner,
            id: row.id,
            sdes_correlation_id: row.sdes_correlation_id,
            failure_reason: row.failure_reason,
            failure_count: row.failure_count,
            locked: row.locked_at.is_some(),
            created_at: row.created_at,
            last_updated: row.last_updated,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub submissions: Vec<SubmissionView>,
}

/// GET /dms-submission/submissions - list submissions for inspection.
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    req: Request,
) -> ApiResult<Json<ListResponse>> {
    require_service(&req)?;

    let status = params
        .status
        .as_deref()
        .map(|s| {
            SubmissionStatus::parse(s)
                .map_err(|_| ApiError::BadRequest(format!("unknown status: {s}")))
        })
        .transpose()?;

    let created_before = params
        .created_before
        .as_deref()
        .map(|s| {
            OffsetDateTime::parse(s, &Rfc3339)
                .map_err(|_| ApiError::BadRequest(format!("invalid created_before: {s}")))
        })
        .transpose()?;

    let query = ListQuery {
        owner: params.owner,
        status,
        created_before,
        limit: params.limit.unwrap_or(50).min(MAX_PAGE_SIZE),
        offset: params.offset.unwrap_or(0),
    };

    let rows = state.metadata.list(&query).await?;
    let submissions = rows
        .into_iter()
        .map(SubmissionView::from_row)
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(ListResponse { submissions }))
}

/// GET /dms-submission/submissions/{owner}/{id} - inspect one submission.
pub async fn get_submission(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, String)>,
    req: Request,
) -> ApiResult<Json<SubmissionView>> {
    require_service(&req)?;

    let row = state
        .metadata
        .get(&owner, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("submission ({owner}, {id})")))?;

    Ok(Json(SubmissionView::from_row(row)?))
}
