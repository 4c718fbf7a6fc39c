use crate::error::AppResult;
use crate::events::RecordEvent;
use crate::models::{job::kinds, Job};

use super::{advance_record, PipelineContext};

/// Enqueue/claim/complete/fail plus the stage-completion hook that runs
/// after a job finishes.
pub struct JobService {
    ctx: PipelineContext,
}

impl JobService {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    pub fn enqueue(
        &self,
        kind: &str,
        record_id: Option<i64>,
        page_id: Option<i64>,
        payload: Option<&str>,
    ) -> AppResult<Job> {
        let job = self.ctx.jobs.enqueue(kind, record_id, page_id, payload)?;
        self.ctx.hub.publish_job(kind);
        self.ctx.hub.publish_record(RecordEvent::Pipeline {
            kind: kind.to_string(),
            status: "pending".to_string(),
        });
        Ok(job)
    }

    pub fn claim(&self, kind: &str) -> AppResult<Option<Job>> {
        Ok(self.ctx.jobs.claim(kind)?)
    }

    pub fn get(&self, job_id: i64) -> AppResult<Option<Job>> {
        Ok(self.ctx.jobs.get(job_id)?)
    }

    /// Mark a job completed, then run the stage-completion hook matching
    /// its kind.
    pub async fn complete(&self, job_id: i64, result_payload: Option<&str>) -> AppResult<Job> {
        let job = self.ctx.jobs.complete(job_id, result_payload)?;
        self.ctx.hub.publish_record(RecordEvent::Pipeline {
            kind: job.kind.clone(),
            status: "completed".to_string(),
        });

        if let Some(record_id) = job.record_id {
            if job.kind.starts_with(kinds::OCR_PAGE_PREFIX)
                || job.kind == kinds::BUILD_SEARCHABLE_PDF
                || kinds::is_translation(&job.kind)
            {
                advance_record(&self.ctx, record_id).await?;
            }
        }

        Ok(job)
    }

    pub fn fail(&self, job_id: i64, error: &str) -> AppResult<Job> {
        let job = self.ctx.jobs.fail(job_id, error)?;
        self.ctx.hub.publish_record(RecordEvent::Pipeline {
            kind: job.kind.clone(),
            status: "failed".to_string(),
        });
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_context;

    #[tokio::test]
    async fn complete_of_unrelated_kind_does_not_touch_record_status() {
        let ctx = test_context();
        let service = JobService::new(ctx.clone());
        let job = service.enqueue("embed_record", None, None, None).unwrap();
        let completed = service.complete(job.id, None).await.unwrap();
        assert_eq!(completed.status, crate::models::JobStatus::Completed);
    }
}
