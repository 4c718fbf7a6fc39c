//! Wire-format DTOs shared across the ingest, processor, and catalog
//! handlers. Kept separate from `archivist::models` because the wire shapes
//! (camelCase-free, but trimmed to what a client needs) are allowed to drift
//! from the storage representation.

use serde::Serialize;

use archivist::models::{Attachment, Job, Page, Record};

#[derive(Debug, Serialize)]
pub struct RecordSummary {
    pub id: i64,
    pub archive_id: i64,
    pub source_system: String,
    pub source_record_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub lang: Option<String>,
    pub metadata_lang: Option<String>,
    pub status: &'static str,
    pub page_count: i64,
    pub attachment_count: i64,
    pub pdf_attachment_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Record> for RecordSummary {
    fn from(r: &Record) -> Self {
        Self {
            id: r.id,
            archive_id: r.archive_id,
            source_system: r.source_system.clone(),
            source_record_id: r.source_record_id.clone(),
            title: r.title.clone(),
            description: r.description.clone(),
            date_start: r.date_start.clone(),
            date_end: r.date_end.clone(),
            lang: r.lang.clone(),
            metadata_lang: r.metadata_lang.clone(),
            status: r.status.as_str(),
            page_count: r.page_count,
            attachment_count: r.attachment_count,
            pdf_attachment_id: r.pdf_attachment_id,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PageSummary {
    pub id: i64,
    pub record_id: i64,
    pub seq: i32,
    pub image_attachment_id: i64,
    pub label: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub source_url: Option<String>,
}

impl From<&Page> for PageSummary {
    fn from(p: &Page) -> Self {
        Self {
            id: p.id,
            record_id: p.record_id,
            seq: p.seq,
            image_attachment_id: p.image_attachment_id,
            label: p.label.clone(),
            width: p.width,
            height: p.height,
            source_url: p.source_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttachmentSummary {
    pub id: i64,
    pub record_id: i64,
    pub role: &'static str,
    pub sha256: String,
    pub mime: String,
    pub byte_size: i64,
}

impl From<&Attachment> for AttachmentSummary {
    fn from(a: &Attachment) -> Self {
        Self {
            id: a.id,
            record_id: a.record_id,
            role: a.role.as_str(),
            sha256: a.sha256.clone(),
            mime: a.mime.clone(),
            byte_size: a.byte_size,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobSummary {
    pub id: i64,
    pub kind: String,
    pub record_id: Option<i64>,
    pub page_id: Option<i64>,
    pub payload: Option<String>,
    pub status: &'static str,
    pub attempts: i64,
}

impl From<&Job> for JobSummary {
    fn from(j: &Job) -> Self {
        Self {
            id: j.id,
            kind: j.kind.clone(),
            record_id: j.record_id,
            page_id: j.page_id,
            payload: j.payload.clone(),
            status: j.status.as_str(),
            attempts: j.attempts,
        }
    }
}
