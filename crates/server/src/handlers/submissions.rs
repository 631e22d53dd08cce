//! Submit pipeline handler.

use crate::auth::require_client;
use crate::error::{ApiError, ApiResult, FieldError};
use crate::services::package;
use crate::state::AppState;
use crate::validation::{RawSubmission, ValidatedSubmission, validate};
use axum::Json;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::StatusCode;
use bytes::Bytes;
use courier_core::SubmissionStatus;
use courier_metadata::models::SubmissionRow;
use serde::Serialize;
use uuid::Uuid;

/// Name of the multipart file part carrying the PDF.
const FILE_PART: &str = "form";

/// Response for an accepted submission.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: String,
    pub status: SubmissionStatus,
}

/// POST /dms-submission/submit - accept a PDF plus routing metadata.
#[tracing::instrument(skip(state, req))]
pub async fn submit(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<(StatusCode, Json<SubmitResponse>)> {
    let client = require_client(&req)?.clone();

    let multipart = Multipart::from_request(req, &state)
        .await
        .map_err(|e| ApiError::BadRequest(format!("expected multipart form: {e}")))?;
    let (raw, file) = collect_form(multipart).await?;

    let validated = match validate(&raw, state.config.server.allow_localhost_callbacks) {
        Ok(validated) => validated,
        Err(mut errors) => {
            if file.is_none() {
                errors.push(FieldError::required(FILE_PART));
            }
            return Err(ApiError::Validation(errors));
        }
    };
    let Some(pdf) = file else {
        return Err(ApiError::Validation(vec![FieldError::required(FILE_PART)]));
    };

    let id = process_submission(&state, &client.principal, validated, pdf).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            id,
            status: SubmissionStatus::Submitted,
        }),
    ))
}

/// Drain the multipart stream into raw text fields plus the file part.
async fn collect_form(mut multipart: Multipart) -> ApiResult<(RawSubmission, Option<Bytes>)> {
    let mut raw = RawSubmission::default();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == FILE_PART {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read file part: {e}")))?;
            file = Some(bytes);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read field {name}: {e}")))?;
            raw.set_field(&name, value);
        }
    }

    Ok((raw, file))
}

/// Package, upload and record one validated submission.
///
/// Order matters: the item row is inserted last so a row always points at a
/// stored object. An upload that succeeds before a later step fails leaves
/// an orphan object behind; operators reconcile those against the listing.
async fn process_submission(
    state: &AppState,
    owner: &str,
    validated: ValidatedSubmission,
    pdf: Bytes,
) -> ApiResult<String> {
    let sdes_correlation_id = Uuid::new_v4().to_string();
    let id = validated
        .submission_reference
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Scratch directory; removed when dropped, on every exit path.
    let workdir = tempfile::tempdir()
        .map_err(|e| ApiError::Internal(format!("failed to create working directory: {e}")))?;

    let archive = package::build_submission_archive(
        workdir.path(),
        &id,
        &sdes_correlation_id,
        &validated.metadata,
        &pdf,
    )
    .await
    .map_err(|e| ApiError::Internal(format!("failed to package submission: {e}")))?;

    let key = format!("{sdes_correlation_id}.zip");
    let summary = state.storage.put(&key, archive).await?;

    let row = SubmissionRow {
        owner: owner.to_string(),
        id: id.clone(),
        sdes_correlation_id: sdes_correlation_id.clone(),
        callback_url: validated.callback_url.to_string(),
        status: SubmissionStatus::Submitted.as_str().to_string(),
        object_location: summary.location,
        object_content_length: summary.content_length,
        object_content_md5: summary.content_md5,
        object_last_modified: summary.last_modified,
        failure_reason: None,
        failure_count: 0,
        locked_at: None,
        // Stamped by the store on insert.
        created_at: summary.last_modified,
        last_updated: summary.last_modified,
    };
    state.metadata.insert(&row).await?;

    tracing::info!(
        owner,
        id = %id,
        correlation_id = %sdes_correlation_id,
        "submission accepted"
    );
    Ok(id)
}
