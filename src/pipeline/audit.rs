//! The self-healing audit engine: eight idempotent reconciliation passes,
//! run at startup and on a timer. Every pass that advances record status
//! delegates to `advance_record` rather than re-checking the transition
//! logic itself.

use serde::Serialize;

use crate::error::AppResult;
use crate::models::{job::kinds, AttachmentRole, RecordStatus};

use super::{advance_record, PipelineContext};

#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub name: &'static str,
    pub fixed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub passes: Vec<PassReport>,
}

impl AuditReport {
    pub fn total_fixed(&self) -> usize {
        self.passes.iter().map(|p| p.fixed).sum()
    }
}

pub struct AuditSettings {
    pub stale_claim_secs: i64,
    pub max_attempts: i64,
    pub stuck_ingesting_secs: i64,
}

pub async fn run_audit(ctx: &PipelineContext, settings: &AuditSettings) -> AppResult<AuditReport> {
    let mut passes = Vec::new();

    passes.push(pass_stale_claimed_jobs(ctx, settings).await?);
    passes.push(pass_failed_retry(ctx, settings).await?);
    passes.push(pass_stuck_ingesting(ctx, settings).await?);
    passes.push(pass_orphaned_ocr_done(ctx).await?);
    passes.push(pass_stuck_pdf_pending(ctx).await?);
    passes.push(pass_legacy_pdf_done(ctx).await?);
    passes.push(pass_stuck_translating(ctx).await?);
    passes.push(pass_missing_translation_events(ctx).await?);

    for pass in &passes {
        if pass.fixed > 0 {
            tracing::info!(pass = pass.name, fixed = pass.fixed, "audit pass fixed records");
        } else {
            tracing::debug!(pass = pass.name, "audit pass found nothing to fix");
        }
    }

    Ok(AuditReport { passes })
}

async fn pass_stale_claimed_jobs(
    ctx: &PipelineContext,
    settings: &AuditSettings,
) -> AppResult<PassReport> {
    let stale = ctx.jobs.stale_claimed(settings.stale_claim_secs)?;
    for job in &stale {
        ctx.jobs.reclaim_stale(job.id)?;
    }
    Ok(PassReport {
        name: "stale_claimed_jobs",
        fixed: stale.len(),
    })
}

async fn pass_failed_retry(ctx: &PipelineContext, settings: &AuditSettings) -> AppResult<PassReport> {
    let retryable = ctx.jobs.retryable_failed(settings.max_attempts)?;
    for job in &retryable {
        ctx.jobs.reset_failed_to_pending(job.id)?;
    }
    Ok(PassReport {
        name: "failed_retry",
        fixed: retryable.len(),
    })
}

async fn pass_stuck_ingesting(
    ctx: &PipelineContext,
    settings: &AuditSettings,
) -> AppResult<PassReport> {
    let (records, _) = ctx.records.list(&crate::repository::RecordFilter {
        status: Some(RecordStatus::Ingesting),
        limit: i64::MAX,
        ..Default::default()
    })?;

    let cutoff = chrono::Utc::now() - chrono::Duration::seconds(settings.stuck_ingesting_secs);
    let mut fixed = 0;

    for record in records {
        if record.page_count == 0 || record.updated_at > cutoff {
            continue;
        }
        let pages = ctx.records.get_pages(record.id)?;
        if pages.len() as i64 != record.page_count {
            continue;
        }

        // Reconstruct what complete_ingest would have done.
        let pages_needing_ocr = ctx.records.pages_without_text(record.id)?;
        if pages_needing_ocr.is_empty() {
            ctx.records
                .transition_status(record.id, RecordStatus::Ingesting, RecordStatus::OcrDone)?;
        } else {
            for page in &pages_needing_ocr {
                let payload = record
                    .lang
                    .as_ref()
                    .map(|lang| serde_json::json!({ "lang": lang }).to_string());
                ctx.jobs.enqueue(
                    kinds::OCR_PAGE_PADDLE,
                    Some(record.id),
                    Some(page.id),
                    payload.as_deref(),
                )?;
                ctx.hub.publish_job(kinds::OCR_PAGE_PADDLE);
            }
            ctx.records.transition_status(
                record.id,
                RecordStatus::Ingesting,
                RecordStatus::OcrPending,
            )?;
        }
        advance_record(ctx, record.id).await?;
        fixed += 1;
    }

    Ok(PassReport {
        name: "stuck_ingesting",
        fixed,
    })
}

async fn pass_orphaned_ocr_done(ctx: &PipelineContext) -> AppResult<PassReport> {
    let (records, _) = ctx.records.list(&crate::repository::RecordFilter {
        status: Some(RecordStatus::OcrDone),
        limit: i64::MAX,
        ..Default::default()
    })?;

    let mut fixed = 0;
    for record in records {
        if !ctx
            .jobs
            .has_job_of_kind(record.id, kinds::BUILD_SEARCHABLE_PDF)?
        {
            advance_record(ctx, record.id).await?;
            fixed += 1;
        }
    }
    Ok(PassReport {
        name: "orphaned_ocr_done",
        fixed,
    })
}

async fn pass_stuck_pdf_pending(ctx: &PipelineContext) -> AppResult<PassReport> {
    let (records, _) = ctx.records.list(&crate::repository::RecordFilter {
        status: Some(RecordStatus::PdfPending),
        limit: i64::MAX,
        ..Default::default()
    })?;

    let mut fixed = 0;
    for record in records {
        let build_jobs = ctx
            .jobs
            .jobs_for_record_by_kind(record.id, kinds::BUILD_SEARCHABLE_PDF)?;
        let build_done = build_jobs
            .iter()
            .any(|j| j.status == crate::models::JobStatus::Completed);
        let has_pdf = ctx
            .records
            .latest_attachment_by_role(record.id, AttachmentRole::SearchablePdf)?
            .is_some();

        if build_done && has_pdf {
            advance_record(ctx, record.id).await?;
            fixed += 1;
        }
    }
    Ok(PassReport {
        name: "stuck_pdf_pending",
        fixed,
    })
}

async fn pass_legacy_pdf_done(ctx: &PipelineContext) -> AppResult<PassReport> {
    let (records, _) = ctx.records.list(&crate::repository::RecordFilter {
        status: Some(RecordStatus::PdfDone),
        limit: i64::MAX,
        ..Default::default()
    })?;

    let mut fixed = 0;
    for record in records {
        advance_record(ctx, record.id).await?;
        fixed += 1;
    }
    Ok(PassReport {
        name: "legacy_pdf_done",
        fixed,
    })
}

async fn pass_stuck_translating(ctx: &PipelineContext) -> AppResult<PassReport> {
    let (records, _) = ctx.records.list(&crate::repository::RecordFilter {
        status: Some(RecordStatus::Translating),
        limit: i64::MAX,
        ..Default::default()
    })?;

    let mut fixed = 0;
    for record in records {
        if ctx.jobs.translation_jobs_all_completed(record.id)? {
            advance_record(ctx, record.id).await?;
            fixed += 1;
        }
    }
    Ok(PassReport {
        name: "stuck_translating",
        fixed,
    })
}

async fn pass_missing_translation_events(ctx: &PipelineContext) -> AppResult<PassReport> {
    let (records, _) = ctx.records.list(&crate::repository::RecordFilter {
        status: Some(RecordStatus::Complete),
        limit: i64::MAX,
        ..Default::default()
    })?;

    let mut fixed = 0;
    for record in records {
        if ctx.jobs.translation_jobs_all_completed(record.id)?
            && !ctx
                .events_log
                .has_event(record.id, "translation", "completed")?
        {
            ctx.events_log
                .log(record.id, "translation", "completed", Some("backfilled by audit"))?;
            fixed += 1;
        }
    }
    Ok(PassReport {
        name: "missing_translation_events",
        fixed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;

    #[tokio::test]
    async fn audit_run_twice_in_a_row_is_a_noop_the_second_time() {
        let ctx = test_context();
        let settings = AuditSettings {
            stale_claim_secs: 3600,
            max_attempts: 3,
            stuck_ingesting_secs: 600,
        };
        run_audit(&ctx, &settings).await.unwrap();
        let second = run_audit(&ctx, &settings).await.unwrap();
        assert_eq!(second.total_fixed(), 0);
    }
}
