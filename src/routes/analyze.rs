use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{AnalysisResult, AnalyzeTextRequest};
use crate::routes::payload::Payload;
use crate::services::{analysis_service, document_service};
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/text", post(analyze_text))
        .route("/pdf", post(analyze_pdf))
        .route("/excel", post(analyze_excel))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
}

/// POST /api/analyze/text
///
/// Request body: `{"text": "..."}` or a `text=...` form
async fn analyze_text(
    State(state): State<AppState>,
    Payload(request): Payload<AnalyzeTextRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    let text = request
        .and_then(|r| r.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("No text provided".to_string()))?;

    info!("POST /api/analyze/text - {} chars", text.len());

    let result = analysis_service::analyze_financial_text(&state.llm_service, &text).await;
    Ok(Json(result))
}

/// POST /api/analyze/pdf
///
/// Multipart upload with the document in the `file` field
async fn analyze_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let bytes = read_file_field(multipart, state.config.max_upload_bytes)
        .await?
        .ok_or_else(|| AppError::Validation("No PDF file uploaded".to_string()))?;

    info!("POST /api/analyze/pdf - {} bytes", bytes.len());

    let text = document_service::extract_pdf_text(bytes).await.map_err(|e| {
        error!("Error analyzing PDF: {:#}", e);
        AppError::internal("Failed to analyze PDF", format!("{:#}", e))
    })?;
    require_text(&text, "PDF")?;

    let result = analysis_service::analyze_financial_text(&state.llm_service, &text).await;
    Ok(Json(result))
}

/// POST /api/analyze/excel
///
/// Multipart upload with the workbook in the `file` field
async fn analyze_excel(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let bytes = read_file_field(multipart, state.config.max_upload_bytes)
        .await?
        .ok_or_else(|| AppError::Validation("No Excel file uploaded".to_string()))?;

    info!("POST /api/analyze/excel - {} bytes", bytes.len());

    let text = document_service::extract_excel_text(bytes).await.map_err(|e| {
        error!("Error analyzing Excel: {:#}", e);
        AppError::internal("Failed to analyze Excel file", format!("{:#}", e))
    })?;
    require_text(&text, "Excel file")?;

    let result = analysis_service::analyze_financial_text(&state.llm_service, &text).await;
    Ok(Json(result))
}

/// Bytes of the `file` part, or `None` when the request carries no such part
async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
    max_upload_bytes: usize,
) -> Result<Option<Vec<u8>>, AppError> {
    // A body that is not multipart at all has no file in it either.
    let Ok(mut multipart) = multipart else {
        return Ok(None);
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, max_upload_bytes))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error(e, max_upload_bytes))?;

        if bytes.len() > max_upload_bytes {
            return Err(AppError::PayloadTooLarge(max_upload_bytes));
        }
        if bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(bytes.to_vec()));
    }

    Ok(None)
}

fn upload_error(err: MultipartError, max_upload_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(max_upload_bytes)
    } else {
        error!("Failed to read multipart upload: {}", err);
        AppError::internal("Failed to read upload", err.body_text())
    }
}

fn require_text(text: &str, kind: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "No text could be extracted from the uploaded {}",
            kind
        )));
    }
    Ok(())
}
