//! HTTP surfaces for the archive orchestrator: ingest (scrapers), processor
//! (workers), and catalog (the viewer UI).

mod auth;
mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use archivist::pipeline::{AuditSettings, PipelineContext};
use archivist::presence::{ScraperRegistry, WorkerRegistry};
use archivist::repository::ArchiveRepository;

/// Shared state for every handler across all three surfaces.
#[derive(Clone)]
pub struct AppState {
    pub ctx: PipelineContext,
    pub archives: Arc<ArchiveRepository>,
    pub workers: WorkerRegistry,
    pub scrapers: ScraperRegistry,
    pub bearer_token: String,
    pub max_attempts: i64,
    pub stale_claim_secs: i64,
    pub stuck_ingesting_secs: i64,
    pub audit_interval_secs: u64,
    pub text_pdf_max_bytes: usize,
    pub text_pdf_max_pages: usize,
}

impl AppState {
    fn audit_settings(&self) -> AuditSettings {
        AuditSettings {
            stale_claim_secs: self.stale_claim_secs,
            max_attempts: self.max_attempts,
            stuck_ingesting_secs: self.stuck_ingesting_secs,
        }
    }
}

/// Run one audit sweep at startup, then spawn the periodic audit task, then
/// serve the HTTP surface until the process is signaled to stop.
pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    run_audit_once(&state).await;
    spawn_audit_loop(state.clone());

    let app = create_router(state);
    let addr: SocketAddr = bind.parse()?;
    tracing::info!(%addr, "starting archivist HTTP surface");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_audit_once(state: &AppState) {
    let settings = state.audit_settings();
    match archivist::pipeline::run_audit(&state.ctx, &settings).await {
        Ok(report) => {
            if report.total_fixed() > 0 {
                tracing::info!(fixed = report.total_fixed(), "startup audit fixed records");
            } else {
                tracing::debug!("startup audit found nothing to fix");
            }
        }
        Err(e) => tracing::warn!(error = %e, "startup audit sweep failed"),
    }
}

fn spawn_audit_loop(state: AppState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(state.audit_interval_secs));
        interval.tick().await; // first tick fires immediately; startup sweep already ran
        loop {
            interval.tick().await;
            let settings = state.audit_settings();
            match archivist::pipeline::run_audit(&state.ctx, &settings).await {
                Ok(report) => {
                    if report.total_fixed() > 0 {
                        tracing::info!(fixed = report.total_fixed(), "periodic audit fixed records");
                    } else {
                        tracing::debug!("periodic audit found nothing to fix");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "periodic audit sweep failed"),
            }
        }
    });
}
