use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::ApiResponse;
use crate::error::AppError;
use crate::issue::{IssuedCertificate, VerificationRequest};
use crate::state::AppState;

pub async fn verify_and_generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerificationRequest>, JsonRejection>,
) -> Result<Json<ApiResponse>, AppError> {
    let Json(request) = payload?;
    let certificate = issue(&state, request).await?;
    Ok(Json(ApiResponse::certificate(&certificate)))
}

pub async fn download_certificate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<VerificationRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let certificate = issue(&state, request).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                header_safe(&certificate.filename)
            ),
        )
        .body(Body::from(certificate.pdf))
        .map_err(|e| {
            tracing::error!("Failed to build certificate response: {}", e);
            AppError::Internal
        })
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Run the blocking verify-and-render pipeline off the async workers.
async fn issue(
    state: &Arc<AppState>,
    request: VerificationRequest,
) -> Result<IssuedCertificate, AppError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("issue", %request_id);
    let state = Arc::clone(state);

    tokio::task::spawn_blocking(move || span.in_scope(|| state.service.issue(&request)))
        .await
        .map_err(|e| {
            tracing::error!(%request_id, "Certificate task failed: {}", e);
            AppError::Internal
        })?
        .map_err(AppError::from)
}

/// Header values must stay printable ASCII; anything else becomes `_`.
fn header_safe(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
