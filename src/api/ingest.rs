use crate::api::AppState;
use crate::api::schemas::ingest::IngestResponse;
use crate::error::{AppError, Result};
use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

/// Parses the request body as a message batch and delivers it.
///
/// The `Content-Type` value is used verbatim as the format hint. `amount` in the
/// response is the size of the batch, skipped recipients included.
///
/// # Errors
/// Returns a 422 for unreadable or invalid batches and a 500 if delivery fails.
pub async fn ingest_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse> {
    let body = body.map_err(|e| AppError::BodyRead(e.body_text()))?;
    let hint = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default();

    let report = state.ingest_service.ingest(hint, &body).await?;

    Ok((StatusCode::CREATED, Json(IngestResponse::ok(report.total))))
}
