//! Scraper-facing surface: upsert a record, attach its pages/PDF, and
//! signal when ingestion is done.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use archivist::error::{AppError, AppResult};
use archivist::pipeline::IngestService;

use super::dto::{AttachmentSummary, PageSummary, RecordSummary};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct UpsertRecordRequest {
    pub archive: String,
    pub archive_country: Option<String>,
    pub source_system: String,
    pub source_record_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub lang: Option<String>,
    pub metadata_lang: Option<String>,
}

pub async fn upsert_record(
    State(state): State<AppState>,
    Json(body): Json<UpsertRecordRequest>,
) -> AppResult<impl IntoResponse> {
    let archive = state
        .archives
        .get_or_create(&body.archive, body.archive_country.as_deref())?;

    let service = IngestService::new(state.ctx.clone());
    let record = service.upsert_record(
        archive.id,
        &body.source_system,
        &body.source_record_id,
        body.title.as_deref(),
        body.description.as_deref(),
        body.date_start.as_deref(),
        body.date_end.as_deref(),
        body.lang.as_deref(),
        body.metadata_lang.as_deref(),
    )?;

    Ok((StatusCode::CREATED, Json(RecordSummary::from(&record))))
}

#[derive(Debug, Default, Deserialize)]
struct PageMetadata {
    seq: Option<i32>,
    label: Option<String>,
    width: Option<i32>,
    height: Option<i32>,
    source_url: Option<String>,
}

pub async fn attach_page(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut image_bytes: Option<Vec<u8>> = None;
    let mut image_mime = String::from("application/octet-stream");
    let mut metadata = PageMetadata::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.to_string()))?
    {
        match field.name().unwrap_or_default() {
            "image" => {
                image_mime = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or(image_mime);
                image_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::InvalidInput(e.to_string()))?
                        .to_vec(),
                );
            }
            "metadata" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                metadata = serde_json::from_str(&text)?;
            }
            _ => {}
        }
    }

    let image_bytes =
        image_bytes.ok_or_else(|| AppError::InvalidInput("missing image part".to_string()))?;
    let seq = metadata
        .seq
        .ok_or_else(|| AppError::InvalidInput("metadata.seq is required".to_string()))?;

    let service = IngestService::new(state.ctx.clone());
    let page = service
        .attach_page(
            record_id,
            seq,
            &image_bytes,
            &image_mime,
            metadata.label.as_deref(),
            metadata.width,
            metadata.height,
            metadata.source_url.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PageSummary::from(&page))))
}

pub async fn attach_pdf(
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

    let service = IngestService::new(state.ctx.clone());
    let attachment = service.attach_original_pdf(record_id, &pdf_bytes).await?;

    Ok((StatusCode::CREATED, Json(AttachmentSummary::from(&attachment))))
}

#[derive(Debug, Serialize)]
pub struct TextPdfResponse {
    pub record_id: i64,
    pub pages: usize,
    pub ocr_skipped: bool,
}

/// Ingest a born-digital PDF that has already been rasterized and
/// text-extracted by the scraper: each page arrives as a paired `image_N`
/// (bytes) / `text_N` (string) multipart field, `N` starting at 1. There is
/// no PDF-rendering crate in this stack, so a raw PDF blob alone cannot be
/// turned into per-page images and text server-side.
pub async fn attach_text_pdf(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut images: Vec<(usize, Vec<u8>)> = Vec::new();
    let mut texts: Vec<(usize, String)> = Vec::new();
    let mut total_bytes: usize = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(idx) = name.strip_prefix("image_").and_then(|s| s.parse::<usize>().ok()) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::InvalidInput(e.to_string()))?;
            total_bytes += bytes.len();
            if total_bytes > state.text_pdf_max_bytes {
                return Err(AppError::InvalidInput(format!(
                    "text PDF exceeds {} byte cap",
                    state.text_pdf_max_bytes
                )));
            }
            images.push((idx, bytes.to_vec()));
        } else if let Some(idx) = name.strip_prefix("text_").and_then(|s| s.parse::<usize>().ok()) {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::InvalidInput(e.to_string()))?;
            texts.push((idx, text));
        }
    }

    if images.len() > state.text_pdf_max_pages {
        return Err(AppError::InvalidInput(format!(
            "text PDF exceeds {} page cap",
            state.text_pdf_max_pages
        )));
    }

    images.sort_by_key(|(idx, _)| *idx);
    texts.sort_by_key(|(idx, _)| *idx);
    let page_images: Vec<Vec<u8>> = images.into_iter().map(|(_, b)| b).collect();
    let page_texts: Vec<String> = texts.into_iter().map(|(_, t)| t).collect();

    let service = IngestService::new(state.ctx.clone());
    let pages = service
        .attach_text_pdf(record_id, &page_images, &page_texts)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TextPdfResponse {
            record_id,
            pages,
            ocr_skipped: true,
        }),
    ))
}

pub async fn repair_record(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let service = IngestService::new(state.ctx.clone());
    let record = service.repair(record_id)?;
    let seqs: Vec<i32> = state
        .ctx
        .records
        .get_pages(record_id)?
        .iter()
        .map(|p| p.seq)
        .collect();

    Ok(Json(serde_json::json!({
        "record": RecordSummary::from(&record),
        "existingPageSeqs": seqs,
    })))
}

pub async fn complete_ingest(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let service = IngestService::new(state.ctx.clone());
    let record = service.complete_ingest(record_id).await?;
    Ok(Json(RecordSummary::from(&record)))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> AppResult<StatusCode> {
    let service = IngestService::new(state.ctx.clone());
    service.delete_record(record_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn ingest_status(
    State(state): State<AppState>,
    Path((source_system, source_record_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .ctx
        .records
        .get_by_source(&source_system, &source_record_id)?
        .ok_or_else(|| AppError::NotFound(format!("{source_system}/{source_record_id}")))?;
    Ok(Json(RecordSummary::from(&record)))
}
