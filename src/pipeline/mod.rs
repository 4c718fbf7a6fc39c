//! The orchestration core: ingest, job lifecycle, stage-completion
//! fan-out, and the self-healing audit engine.
//!
//! `advance_record` is the load-bearing function in this module (see
//! design note "audit engine vs. in-line stage advancement"): both the
//! stage-completion hook and every audit pass that touches record status
//! call it instead of re-implementing the transition logic, so the two
//! call sites cannot diverge.

mod audit;
mod fanout;
mod ingest;
mod jobs;

pub use audit::{run_audit, AuditReport, AuditSettings};
pub use fanout::advance_record;
pub use ingest::IngestService;
pub use jobs::JobService;

use std::sync::Arc;

use crate::events::EventHub;
use crate::repository::{JobRepository, PipelineEventRepository, RecordRepository};
use crate::storage::BlobStore;

/// Shared handle to everything the pipeline needs to touch. Cloned cheaply
/// (every field is `Arc`-backed) and passed into the ingest/job services
/// and the audit engine alike.
#[derive(Clone)]
pub struct PipelineContext {
    pub records: Arc<RecordRepository>,
    pub jobs: Arc<JobRepository>,
    pub events_log: Arc<PipelineEventRepository>,
    pub blobs: Arc<BlobStore>,
    pub hub: Arc<EventHub>,
}
