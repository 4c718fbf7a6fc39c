use std::sync::Arc;
use std::time::Duration;

use archivist::config::Settings;
use archivist::events::EventHub;
use archivist::pipeline::{run_audit, AuditSettings, PipelineContext};
use archivist::repository::{JobRepository, PipelineEventRepository, RecordRepository};
use archivist::storage::BlobStore;

pub async fn cmd_audit(settings: &Settings) -> anyhow::Result<()> {
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

    let audit_settings = AuditSettings {
        stale_claim_secs: settings.stale_claim_secs,
        max_attempts: settings.max_attempts,
        stuck_ingesting_secs: settings.stuck_ingesting_secs,
    };

    let report = run_audit(&ctx, &audit_settings).await?;

    for pass in &report.passes {
        if pass.fixed > 0 {
            println!("{}: fixed {}", pass.name, pass.fixed);
        } else {
            println!("{}: nothing to fix", pass.name);
        }
    }
    println!("total fixed: {}", report.total_fixed());

    Ok(())
}
