use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use tracing::{error, info, warn};

use crate::{
    dto::submission_dto::ErrorBody,
    error::{ApiError, Error},
    services::{
        export_service::{ExportService, XLSX_CONTENT_TYPE},
        normalize_service::{JoinPolicy, NormalizeService},
    },
    utils::time,
    AppState,
};

const FETCH_FAILED: &str = "Failed to fetch submissions";
const NOT_FOUND: &str = "Submission not found";
const EXPORT_FAILED: &str = "Failed to generate Excel file";

#[utoipa::path(
    get,
    path = "/api/submissions",
    responses(
        (status = 200, description = "All submissions, newest first, with derived display fields"),
        (status = 500, description = "Store query failed", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn list_submissions(
    State(state): State<AppState>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let rows = state.store.fetch_all().await.map_err(|e| {
        error!(error = %e, "Error fetching submissions");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED).with_details(e.details())
    })?;

    let processed = NormalizeService::normalize_all(&rows, JoinPolicy::Display);
    info!(count = processed.len(), "Processed submissions");
    Ok(Json(processed))
}

#[utoipa::path(
    get,
    path = "/api/submissions/{id}",
    params(
        ("id" = String, Path, description = "Submission ID")
    ),
    responses(
        (status = 200, description = "The stored submission row"),
        (status = 404, description = "Submission not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let submission = state.store.fetch_by_id(&id).await.map_err(|e| {
        log_lookup_failure(&id, &e);
        ApiError::new(StatusCode::NOT_FOUND, NOT_FOUND)
    })?;
    Ok(Json(submission))
}

#[utoipa::path(
    get,
    path = "/api/submissions/{id}/parsed",
    params(
        ("id" = String, Path, description = "Submission ID")
    ),
    responses(
        (status = 200, description = "Submission plus key/value lists of both answer columns"),
        (status = 404, description = "Submission not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn get_submission_parsed(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let submission = state.store.fetch_by_id(&id).await.map_err(|e| {
        log_lookup_failure(&id, &e);
        ApiError::new(StatusCode::NOT_FOUND, NOT_FOUND).with_details(e.details())
    })?;

    let parsed = NormalizeService::parse_submission(submission);
    info!(
        id = %id,
        refleksi = parsed.jawaban_refleksi_parsed.len(),
        kuis = parsed.jawaban_kuis_parsed.len(),
        "Parsed submission"
    );
    Ok(Json(parsed))
}

#[utoipa::path(
    get,
    path = "/api/submissions/export/excel",
    responses(
        (status = 200, description = "XLSX workbook of every submission"),
        (status = 500, description = "Store query or workbook generation failed", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn export_submissions(
    State(state): State<AppState>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let rows = state.store.fetch_all().await.map_err(|e| {
        error!(error = %e, "Error fetching submissions for export");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED).with_details(e.details())
    })?;

    let records = NormalizeService::normalize_all(&rows, JoinPolicy::Export);
    let buffer = ExportService::generate_submissions_xlsx(&records, &state.export_options)
        .map_err(|e| {
            error!(error = %e, "Error generating workbook");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, EXPORT_FAILED).with_details(e.details())
        })?;

    let filename = ExportService::export_filename(time::today(state.export_options.utc_offset));
    let disposition = format!("attachment; filename=\"{}\"", filename);
    info!(rows = records.len(), bytes = buffer.len(), %filename, "Exported submissions");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}

fn log_lookup_failure(id: &str, err: &Error) {
    match err {
        Error::NotFound(_) => warn!(id = %id, "Submission not found"),
        other => error!(id = %id, error = %other, details = %other.details(), "Error fetching submission"),
    }
}
