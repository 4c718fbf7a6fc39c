//! Worker-facing surface: claim/complete/fail jobs, fetch page images, and
//! post back OCR text, OCR artifacts, searchable PDFs, and entities.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use archivist::error::{AppError, AppResult};
use archivist::events::{worker_sse_response, SseStream};
use archivist::models::AttachmentRole;
use archivist::pipeline::JobService;

use super::dto::JobSummary;
use crate::server::AppState;

pub async fn job_events(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> SseStream {
    let worker_id = headers
        .get("x-worker-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let receiver = state.ctx.hub.subscribe_worker(&worker_id).await;
    worker_sse_response(receiver)
}

#[derive(Debug, Deserialize)]
pub struct ClaimRequest {
    pub kind: String,
}

pub async fn claim_job(
    State(state): State<AppState>,
    Json(body): Json<ClaimRequest>,
) -> AppResult<Response> {
    let service = JobService::new(state.ctx.clone());
    match service.claim(&body.kind)? {
        Some(job) => Ok((StatusCode::OK, Json(JobSummary::from(&job))).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct CompleteJobRequest {
    pub result: Option<serde_json::Value>,
}

pub async fn complete_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    Json(body): Json<CompleteJobRequest>,
) -> AppResult<impl IntoResponse> {
    let result_payload = body
        .result
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let service = JobService::new(state.ctx.clone());
    let job = service.complete(job_id, result_payload.as_deref()).await?;
    Ok(Json(JobSummary::from(&job)))
}

#[derive(Debug, Deserialize)]
pub struct FailJobRequest {
    pub error: String,
}

pub async fn fail_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
    Json(body): Json<FailJobRequest>,
) -> AppResult<impl IntoResponse> {
    let service = JobService::new(state.ctx.clone());
    let job = service.fail(job_id, &body.error)?;
    Ok(Json(JobSummary::from(&job)))
}

pub async fn page_image(
    State(state): State<AppState>,
    Path(page_id): Path<i64>,
) -> AppResult<Response> {
    let page = state
        .ctx
        .records
        .get_page(page_id)?
        .ok_or_else(|| AppError::NotFound(format!("page {page_id}")))?;
    let attachment = state
        .ctx
        .records
        .get_attachment(page.image_attachment_id)?
        .ok_or_else(|| AppError::NotFound(format!("attachment {}", page.image_attachment_id)))?;
    let bytes = state.ctx.blobs.read(&attachment.path).await?;

    Ok(([(header::CONTENT_TYPE, attachment.mime)], bytes).into_response())
}

#[derive(Debug, Deserialize)]
pub struct OcrTextRequest {
    pub engine: String,
    pub confidence: Option<f64>,
    pub text_raw: String,
    pub hocr: Option<String>,
}

pub async fn post_ocr_text(
    State(state): State<AppState>,
    Path(page_id): Path<i64>,
    Json(body): Json<OcrTextRequest>,
) -> AppResult<impl IntoResponse> {
    let page_text = state.ctx.records.insert_page_text(
        page_id,
        &body.engine,
        body.confidence,
        &body.text_raw,
        None,
        body.hocr.as_deref(),
    )?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": page_text.id }))))
}

pub async fn post_ocr_artifact(
    State(state): State<AppState>,
    Path(page_id): Path<i64>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let page = state
        .ctx
        .records
        .get_page(page_id)?
        .ok_or_else(|| AppError::NotFound(format!("page {page_id}")))?;

    let mut bytes: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.to_string()))?
    {
        if field.name() == Some("artifact") {
            let filename = field
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("p{:04}.artifact", page.seq));
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(e.to_string()))?
                .to_vec();
            bytes = Some((filename, data));
        }
    }
    let (filename, data) =
        bytes.ok_or_else(|| AppError::InvalidInput("missing artifact part".to_string()))?;

    let path = archivist::storage::BlobStore::ocr_artifact_path(page.record_id, &filename);
    let sha256 = state.ctx.blobs.write(&path, &data).await?;
    let attachment = state.ctx.records.insert_attachment(
        page.record_id,
        AttachmentRole::OcrArtifact,
        &path,
        &sha256,
        "application/octet-stream",
        data.len() as i64,
    )?;

    Ok((StatusCode::CREATED, Json(super::dto::AttachmentSummary::from(&attachment))))
}

pub async fn post_searchable_pdf(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut pdf_bytes: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.to_string()))?
    {
        if field.name() == Some("pdf") {
            pdf_bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?
                    .to_vec(),
            );
        }
    }
    let pdf_bytes =
        pdf_bytes.ok_or_else(|| AppError::InvalidInput("missing pdf part".to_string()))?;

    let path = archivist::storage::BlobStore::searchable_pdf_path(record_id);
    let sha256 = state.ctx.blobs.write(&path, &pdf_bytes).await?;
    let attachment = state.ctx.records.insert_attachment(
        record_id,
        AttachmentRole::SearchablePdf,
        &path,
        &sha256,
        "application/pdf",
        pdf_bytes.len() as i64,
    )?;

    Ok((StatusCode::CREATED, Json(super::dto::AttachmentSummary::from(&attachment))))
}

#[derive(Debug, Deserialize)]
pub struct EntityHit {
    pub kind: String,
    pub value: String,
    pub confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct EntitiesResponse {
    pub inserted: usize,
}

pub async fn post_entities(
    State(state): State<AppState>,
    Path(page_id): Path<i64>,
    Json(hits): Json<Vec<EntityHit>>,
) -> AppResult<impl IntoResponse> {
    state
        .ctx
        .records
        .get_page(page_id)?
        .ok_or_else(|| AppError::NotFound(format!("page {page_id}")))?;

    for hit in &hits {
        state
            .ctx
            .records
            .insert_entity(page_id, &hit.kind, &hit.value, hit.confidence)?;
    }

    Ok((StatusCode::CREATED, Json(EntitiesResponse { inserted: hits.len() })))
}
