use crate::error::AppResult;
use crate::events::RecordEvent;
use crate::models::{AttachmentRole, RecordStatus};

use super::PipelineContext;

/// Advance a single record as far as it can legally go from its current
/// status, applying every conditional transition that currently holds and
/// looping until a full pass makes no further change. Idempotent: calling
/// this on a record that cannot progress is a no-op.
///
/// Both the stage-completion hook (`JobService::complete`) and every audit
/// pass that touches record status call this instead of re-implementing
/// the checks below.
pub async fn advance_record(ctx: &PipelineContext, record_id: i64) -> AppResult<()> {
    const MAX_PASSES: usize = 8;

    for _ in 0..MAX_PASSES {
        let Some(record) = ctx.records.get(record_id)? else {
            return Ok(());
        };

        let progressed = match record.status {
            RecordStatus::OcrPending => try_finish_ocr(ctx, record_id).await?,
            RecordStatus::OcrDone => try_post_ocr_fanout(ctx, record_id).await?,
            RecordStatus::PdfPending => try_finish_pdf(ctx, record_id).await?,
            RecordStatus::PdfDone => try_finish_pdf_done(ctx, record_id).await?,
            RecordStatus::Translating => try_finish_translation(ctx, record_id).await?,
            RecordStatus::Ingesting | RecordStatus::Complete => false,
        };

        if !progressed {
            return Ok(());
        }
    }

    tracing::warn!(record_id, "advance_record hit its pass limit; record may be cycling");
    Ok(())
}

async fn try_finish_ocr(ctx: &PipelineContext, record_id: i64) -> AppResult<bool> {
    if ctx.records.count_pages_without_text(record_id)? != 0 {
        return Ok(false);
    }

    let applied = ctx
        .records
        .transition_status(record_id, RecordStatus::OcrPending, RecordStatus::OcrDone)?;
    if applied {
        ctx.events_log.log(record_id, "ocr", "completed", None)?;
        ctx.hub.publish_record(RecordEvent::Pipeline {
            kind: "ocr".to_string(),
            status: "completed".to_string(),
        });
    }
    Ok(applied)
}

async fn try_post_ocr_fanout(ctx: &PipelineContext, record_id: i64) -> AppResult<bool> {
    if ctx
        .jobs
        .has_job_of_kind(record_id, crate::models::job::kinds::BUILD_SEARCHABLE_PDF)?
    {
        return Ok(false);
    }

    let record = match ctx.records.get(record_id)? {
        Some(r) => r,
        None => return Ok(false),
    };

    ctx.jobs
        .enqueue(
            crate::models::job::kinds::BUILD_SEARCHABLE_PDF,
            Some(record_id),
            None,
            None,
        )?;
    ctx.hub
        .publish_job(crate::models::job::kinds::BUILD_SEARCHABLE_PDF);

    let metadata_payload = serde_json::json!({ "lang": record.metadata_lang }).to_string();
    ctx.jobs.enqueue(
        crate::models::job::kinds::TRANSLATE_RECORD,
        Some(record_id),
        None,
        Some(&metadata_payload),
    )?;
    ctx.hub
        .publish_job(crate::models::job::kinds::TRANSLATE_RECORD);

    let mut page_jobs_enqueued = 0;
    if record.lang.as_deref() != Some("en") {
        for page in ctx.records.get_pages(record_id)? {
            ctx.jobs.enqueue(
                crate::models::job::kinds::TRANSLATE_PAGE,
                Some(record_id),
                Some(page.id),
                None,
            )?;
            ctx.hub.publish_job(crate::models::job::kinds::TRANSLATE_PAGE);
            page_jobs_enqueued += 1;
        }
    }

    let applied = ctx
        .records
        .transition_status(record_id, RecordStatus::OcrDone, RecordStatus::PdfPending)?;
    if applied {
        ctx.events_log.log(record_id, "pdf_build", "started", None)?;
        ctx.events_log.log(
            record_id,
            "translation",
            "started",
            Some(&format!("{page_jobs_enqueued} page jobs enqueued")),
        )?;
    }
    Ok(true)
}

async fn try_finish_pdf(ctx: &PipelineContext, record_id: i64) -> AppResult<bool> {
    let Some(attachment) = ctx
        .records
        .latest_attachment_by_role(record_id, AttachmentRole::SearchablePdf)?
    else {
        return Ok(false);
    };

    ctx.records.set_pdf_attachment(record_id, attachment.id)?;
    let applied = ctx
        .records
        .transition_status(record_id, RecordStatus::PdfPending, RecordStatus::PdfDone)?;
    if applied {
        ctx.events_log.log(record_id, "pdf_build", "completed", None)?;
    }
    Ok(applied)
}

async fn try_finish_pdf_done(ctx: &PipelineContext, record_id: i64) -> AppResult<bool> {
    let all_done = ctx.jobs.translation_jobs_all_completed(record_id)?;
    if all_done {
        let applied = ctx
            .records
            .transition_status(record_id, RecordStatus::PdfDone, RecordStatus::Complete)?;
        if applied {
            ctx.events_log.log(record_id, "translation", "completed", None)?;
            ctx.hub.publish_record(RecordEvent::Pipeline {
                kind: "translation".to_string(),
                status: "completed".to_string(),
            });
        }
        Ok(applied)
    } else {
        ctx.records
            .transition_status(record_id, RecordStatus::PdfDone, RecordStatus::Translating)
    }
}

async fn try_finish_translation(ctx: &PipelineContext, record_id: i64) -> AppResult<bool> {
    if !ctx.jobs.translation_jobs_all_completed(record_id)? {
        return Ok(false);
    }

    let applied = ctx
        .records
        .transition_status(record_id, RecordStatus::Translating, RecordStatus::Complete)?;
    if applied {
        ctx.events_log.log(record_id, "translation", "completed", None)?;
        ctx.hub.publish_record(RecordEvent::Pipeline {
            kind: "translation".to_string(),
            status: "completed".to_string(),
        });
    }
    Ok(applied)
}
