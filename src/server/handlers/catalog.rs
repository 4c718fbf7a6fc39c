//! Viewer-facing surface: list/search/browse records and stream their
//! blobs, plus the UI's SSE change stream. Entirely unauthenticated.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use archivist::error::{AppError, AppResult};
use archivist::events::{ui_sse_response, SseStream};
use archivist::models::{AttachmentRole, RecordStatus};
use archivist::repository::RecordFilter;

use super::dto::{PageSummary, RecordSummary};
use crate::server::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ListRecordsQuery {
    pub archive_id: Option<i64>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecordListResponse {
    pub records: Vec<RecordSummary>,
    pub total: u64,
}

pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<ListRecordsQuery>,
) -> AppResult<impl IntoResponse> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            RecordStatus::from_str(s)
                .ok_or_else(|| AppError::InvalidInput(format!("unknown status: {s}")))
        })
        .transpose()?;

    let filter = RecordFilter {
        archive_id: query.archive_id,
        status,
        limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        offset: query.offset.unwrap_or(0),
    };

    let (records, total) = state.ctx.records.list(&filter)?;
    Ok(Json(RecordListResponse {
        records: records.iter().map(RecordSummary::from).collect(),
        total,
    }))
}

pub async fn get_record(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .ctx
        .records
        .get(record_id)?
        .ok_or_else(|| AppError::NotFound(format!("record {record_id}")))?;
    Ok(Json(RecordSummary::from(&record)))
}

pub async fn list_record_pages(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let pages = state.ctx.records.get_pages(record_id)?;
    Ok(Json(
        pages.iter().map(PageSummary::from).collect::<Vec<_>>(),
    ))
}

pub async fn record_events(State(state): State<AppState>) -> SseStream {
    let receiver = state.ctx.hub.subscribe_ui();
    ui_sse_response(receiver)
}

pub async fn get_file(
    State(state): State<AppState>,
    Path(attachment_id): Path<i64>,
) -> AppResult<Response> {
    let attachment = state
        .ctx
        .records
        .get_attachment(attachment_id)?
        .ok_or_else(|| AppError::NotFound(format!("attachment {attachment_id}")))?;
    let bytes = state.ctx.blobs.read(&attachment.path).await?;
    Ok(([(header::CONTENT_TYPE, attachment.mime)], bytes).into_response())
}

pub async fn get_record_pdf(
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> AppResult<Response> {
    let attachment = state
        .ctx
        .records
        .latest_attachment_by_role(record_id, AttachmentRole::SearchablePdf)?
        .ok_or_else(|| AppError::NotFound(format!("no searchable pdf for record {record_id}")))?;
    let bytes = state.ctx.blobs.read(&attachment.path).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/pdf")],
        bytes,
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub archive_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn search_records(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let (records, total) = state.ctx.records.search(
        &query.q,
        query.archive_id,
        query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        query.offset.unwrap_or(0),
    )?;
    Ok(Json(RecordListResponse {
        records: records.iter().map(RecordSummary::from).collect(),
        total,
    }))
}
