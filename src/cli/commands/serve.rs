use std::sync::Arc;
use std::time::Duration;

use archivist::config::Settings;
use archivist::events::EventHub;
use archivist::pipeline::PipelineContext;
use archivist::presence::{ScraperRegistry, WorkerRegistry};
use archivist::repository::{
    ArchiveRepository, JobRepository, PipelineEventRepository, RecordRepository,
};
use archivist::storage::BlobStore;

use crate::server::AppState;

pub async fn cmd_serve(settings: &Settings, bind: &str) -> anyhow::Result<()> {
    let db_path = settings.database_path();
    archivist::repository::run_all_migrations(&db_path)?;

    let ctx = PipelineContext {
        records: Arc::new(RecordRepository::new(&db_path)?),
        jobs: Arc::new(JobRepository::new(&db_path)?),
        events_log: Arc::new(PipelineEventRepository::new(&db_path)?),
        blobs: Arc::new(BlobStore::new(settings.blob_root.clone())),
        hub: Arc::new(EventHub::new(Duration::from_secs(
            settings.event_stream_idle_secs,
        ))),
    };
    let archives = Arc::new(ArchiveRepository::new(&db_path)?);
    let workers = WorkerRegistry::new(settings.worker_presence_ttl_secs as i64);
    let scrapers = ScraperRegistry::new(settings.scraper_presence_ttl_secs as i64);

    let state = AppState {
        ctx,
        archives,
        workers,
        scrapers,
        bearer_token: settings.bearer_token.clone(),
        max_attempts: settings.max_attempts,
        stale_claim_secs: settings.stale_claim_secs,
        stuck_ingesting_secs: settings.stuck_ingesting_secs,
        audit_interval_secs: settings.audit_interval_secs,
        text_pdf_max_bytes: settings.text_pdf_max_bytes,
        text_pdf_max_pages: settings.text_pdf_max_pages,
    };

    crate::server::serve(state, bind).await
}
