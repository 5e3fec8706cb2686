//! PDF library endpoints
//!
//! Endpoints:
//! - POST /upload_pdf/ - Upload a PDF (multipart field `file`)
//! - GET /pdfs/ - List stored PDFs
//! - GET /pdf/:id - Get one PDF's metadata
//! - POST /generate_pdf/ - Generate a PDF from `{title, content}`
//! - GET /pdf/:id/sections/?page=&size= - Page through a PDF's sections
//! - GET /download_pdf/:id - Download the PDF bytes

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};

use crate::db::{DocumentSummary, Section};
use crate::error::{AppError, Result};
use crate::library::{CreatedResponse, GenerateRequest, SectionQuery, UploadedFile};
use crate::pdf::PDF_CONTENT_TYPE;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the PDF router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload_pdf/", post(upload_pdf))
        .route("/pdfs/", get(list_pdfs))
        .route("/pdf/:id", get(get_pdf))
        .route("/pdf/:id/sections/", get(list_sections))
        .route("/generate_pdf/", post(generate_pdf))
        .route("/download_pdf/:id", get(download_pdf))
        .layer(DefaultBodyLimit::max(
            max_upload_bytes.saturating_add(MULTIPART_OVERHEAD),
        ))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /upload_pdf/
async fn upload_pdf(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;

        tracing::debug!(
            file_name = ?file_name,
            content_type = ?content_type,
            size = data.len(),
            "Received upload"
        );

        let id = state
            .library()
            .upload(UploadedFile {
                file_name,
                content_type,
                data: data.to_vec(),
            })
            .await?;

        return Ok((StatusCode::CREATED, Json(CreatedResponse::uploaded(id))));
    }

    tracing::warn!("No file field found in multipart upload");
    Err(AppError::BadRequest(
        "No file provided. Use field name 'file'".to_string(),
    ))
}

/// GET /pdfs/
async fn list_pdfs(State(state): State<AppState>) -> Result<Json<Vec<DocumentSummary>>> {
    let documents = state.library().list().await?;
    Ok(Json(documents))
}

/// GET /pdf/:id
async fn get_pdf(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Json<DocumentSummary>> {
    let document = state.library().get(document_id(id)?).await?;
    Ok(Json(document))
}

/// POST /generate_pdf/
async fn generate_pdf(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    let Json(request) = payload.map_err(|e| {
        if e.status() == StatusCode::UNSUPPORTED_MEDIA_TYPE {
            AppError::UnsupportedMediaType(e.body_text())
        } else {
            AppError::Validation(e.body_text())
        }
    })?;

    let id = state.library().generate(request).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::generated(id))))
}

/// GET /pdf/:id/sections/
async fn list_sections(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
    query: std::result::Result<Query<SectionQuery>, QueryRejection>,
) -> Result<Json<Vec<Section>>> {
    let id = document_id(id)?;
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let sections = state.library().sections(id, &query).await?;
    Ok(Json(sections))
}

/// GET /download_pdf/:id
async fn download_pdf(
    State(state): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> Result<Response> {
    let file = state.library().download(document_id(id)?).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, PDF_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, file.content.len().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", header_file_name(&file.file_name)),
        )
        .header(header::ETAG, format!("\"{}\"", file.checksum))
        .body(Body::from(file.content))
        .map_err(|e| AppError::Internal(e.to_string()))
}

// ============================================================================
// Helpers
// ============================================================================

fn document_id(id: std::result::Result<Path<i64>, PathRejection>) -> Result<i64> {
    id.map(|Path(id)| id)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Failed to read upload: {}", e.body_text()))
    }
}

/// ASCII-only file name for the Content-Disposition header
fn header_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
