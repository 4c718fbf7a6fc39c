use crate::error::{AppError, AppResult};
use crate::events::RecordEvent;
use crate::models::{job::kinds, record::is_valid_lang_code, Attachment, AttachmentRole, Page, Record, RecordStatus};

use super::{advance_record, PipelineContext};

const TEXT_PDF_MAX_BYTES: usize = 100 * 1024 * 1024;
const TEXT_PDF_MAX_PAGES: usize = 500;

/// Record creation/update and the operations that move a record from
/// `ingesting` into the OCR stage.
pub struct IngestService {
    ctx: PipelineContext,
}

impl IngestService {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn upsert_record(
        &self,
        archive_id: i64,
        source_system: &str,
        source_record_id: &str,
        title: Option<&str>,
        description: Option<&str>,
        date_start: Option<&str>,
        date_end: Option<&str>,
        lang: Option<&str>,
        metadata_lang: Option<&str>,
    ) -> AppResult<Record> {
        for code in [lang, metadata_lang].into_iter().flatten() {
            if !is_valid_lang_code(code) {
                return Err(AppError::InvalidInput(format!(
                    "invalid language code: {code}"
                )));
            }
        }

        let (record, created) = self.ctx.records.upsert_record(
            archive_id,
            source_system,
            source_record_id,
            title,
            description,
            date_start,
            date_end,
            lang,
            metadata_lang,
        )?;

        if created {
            self.ctx
                .events_log
                .log(record.id, "ingest", "started", None)?;
            self.ctx
                .hub
                .publish_record(RecordEvent::Created { id: record.id });
        } else {
            self.ctx
                .hub
                .publish_record(RecordEvent::Updated { id: record.id });
        }

        Ok(record)
    }

    pub async fn attach_page(
        &self,
        record_id: i64,
        seq: i32,
        image_bytes: &[u8],
        mime: &str,
        label: Option<&str>,
        width: Option<i32>,
        height: Option<i32>,
        source_url: Option<&str>,
    ) -> AppResult<Page> {
        self.require_record(record_id)?;
        if seq < 1 {
            return Err(AppError::InvalidInput("page seq must be >= 1".to_string()));
        }

        let path = crate::storage::BlobStore::page_image_path(record_id, seq);
        let sha256 = self.ctx.blobs.write(&path, image_bytes).await?;

        let attachment = self.ctx.records.insert_attachment(
            record_id,
            AttachmentRole::PageImage,
            &path,
            &sha256,
            mime,
            image_bytes.len() as i64,
        )?;

        let page = self.ctx.records.upsert_page(
            record_id,
            seq,
            attachment.id,
            label,
            width,
            height,
            source_url,
        )?;

        Ok(page)
    }

    pub async fn attach_original_pdf(&self, record_id: i64, pdf_bytes: &[u8]) -> AppResult<Attachment> {
        self.require_record(record_id)?;
        let path = crate::storage::BlobStore::original_pdf_path(record_id);
        let sha256 = self.ctx.blobs.write(&path, pdf_bytes).await?;
        let attachment = self.ctx.records.insert_attachment(
            record_id,
            AttachmentRole::OriginalPdf,
            &path,
            &sha256,
            "application/pdf",
            pdf_bytes.len() as i64,
        )?;
        self.ctx.records.set_pdf_attachment(record_id, attachment.id)?;
        Ok(attachment)
    }

    /// Ingest a born-digital PDF whose text layer is already extractable:
    /// render each page to a JPEG, extract its text, and create Page +
    /// Attachment + PageText rows directly so `complete_ingest` can skip
    /// OCR for this record entirely.
    pub async fn attach_text_pdf(
        &self,
        record_id: i64,
        page_images: &[Vec<u8>],
        page_texts: &[String],
    ) -> AppResult<usize> {
        self.require_record(record_id)?;

        if page_images.len() != page_texts.len() {
            return Err(AppError::InvalidInput(
                "page image count must match extracted text count".to_string(),
            ));
        }
        if page_images.len() > TEXT_PDF_MAX_PAGES {
            return Err(AppError::InvalidInput(format!(
                "text PDF exceeds {TEXT_PDF_MAX_PAGES} page cap"
            )));
        }
        let total_bytes: usize = page_images.iter().map(|b| b.len()).sum();
        if total_bytes > TEXT_PDF_MAX_BYTES {
            return Err(AppError::InvalidInput(format!(
                "text PDF exceeds {TEXT_PDF_MAX_BYTES} byte cap"
            )));
        }

        for (idx, (image, text)) in page_images.iter().zip(page_texts.iter()).enumerate() {
            let seq = idx as i32 + 1;
            let path = crate::storage::BlobStore::page_image_path(record_id, seq);
            let sha256 = self.ctx.blobs.write(&path, image).await?;
            let attachment = self.ctx.records.insert_attachment(
                record_id,
                AttachmentRole::PageImage,
                &path,
                &sha256,
                "image/jpeg",
                image.len() as i64,
            )?;
            let page = self
                .ctx
                .records
                .upsert_page(record_id, seq, attachment.id, None, None, None, None)?;
            self.ctx
                .records
                .insert_page_text(page.id, "pdfbox-equivalent", Some(1.0), text, None, None)?;
        }

        Ok(page_images.len())
    }

    /// Transition a record out of `ingesting`: enqueue OCR for every page
    /// still lacking text, or skip straight to `ocr_done` if there is
    /// nothing left to OCR (including the zero-page metadata-only case).
    pub async fn complete_ingest(&self, record_id: i64) -> AppResult<Record> {
        let record = self.require_record(record_id)?;

        let pages_needing_ocr = self.ctx.records.pages_without_text(record_id)?;

        self.ctx
            .events_log
            .log(record_id, "ingest", "completed", None)?;

        if pages_needing_ocr.is_empty() {
            self.ctx
                .records
                .transition_status(record_id, RecordStatus::Ingesting, RecordStatus::OcrDone)?;
        } else {
            for page in &pages_needing_ocr {
                let payload = record
                    .lang
                    .as_ref()
                    .map(|lang| serde_json::json!({ "lang": lang }).to_string());
                self.ctx.jobs.enqueue(
                    kinds::OCR_PAGE_PADDLE,
                    Some(record_id),
                    Some(page.id),
                    payload.as_deref(),
                )?;
                self.ctx.hub.publish_job(kinds::OCR_PAGE_PADDLE);
            }
            self.ctx
                .records
                .transition_status(record_id, RecordStatus::Ingesting, RecordStatus::OcrPending)?;
            self.ctx.events_log.log(record_id, "ocr", "started", None)?;
        }

        advance_record(&self.ctx, record_id).await?;

        self.ctx
            .records
            .get(record_id)?
            .ok_or_else(|| AppError::NotFound(format!("record {record_id}")))
    }

    pub fn repair(&self, record_id: i64) -> AppResult<Record> {
        self.require_record(record_id)?;
        self.ctx.records.repair(record_id)?;
        self.ctx
            .records
            .get(record_id)?
            .ok_or_else(|| AppError::NotFound(format!("record {record_id}")))
    }

    pub async fn delete_record(&self, record_id: i64) -> AppResult<()> {
        self.require_record(record_id)?;
        self.ctx.blobs.delete_record_tree(record_id).await?;
        self.ctx.records.delete_record(record_id)?;
        Ok(())
    }

    fn require_record(&self, record_id: i64) -> AppResult<Record> {
        self.ctx
            .records
            .get(record_id)?
            .ok_or_else(|| AppError::NotFound(format!("record {record_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;

    fn service() -> (PipelineContext, IngestService) {
        let ctx = test_context();
        (ctx.clone(), IngestService::new(ctx))
    }

    #[tokio::test]
    async fn zero_page_record_bypasses_ocr_straight_to_done() {
        let (ctx, svc) = service();
        let record = svc
            .upsert_record(1, "nara", "r1", None, None, None, None, None, None)
            .unwrap();
        let reloaded = svc.complete_ingest(record.id).await.unwrap();
        assert_eq!(reloaded.status, RecordStatus::PdfPending);
        let _ = ctx;
    }

    #[tokio::test]
    async fn invalid_lang_code_is_rejected() {
        let (_ctx, svc) = service();
        let err = svc
            .upsert_record(1, "nara", "r1", None, None, None, None, Some("deu"), None)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn complete_ingest_enqueues_one_ocr_job_per_unocred_page() {
        let (ctx, svc) = service();
        let record = svc
            .upsert_record(1, "nara", "r1", None, None, None, None, Some("de"), Some("cs"))
            .unwrap();
        svc.attach_page(record.id, 1, b"img1", "image/jpeg", None, None, None, None)
            .await
            .unwrap();
        svc.attach_page(record.id, 2, b"img2", "image/jpeg", None, None, None, None)
            .await
            .unwrap();

        let reloaded = svc.complete_ingest(record.id).await.unwrap();
        assert_eq!(reloaded.status, RecordStatus::OcrPending);

        let jobs = ctx.jobs.jobs_for_record(record.id).unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.kind == "ocr_page_paddle"));
    }
}
