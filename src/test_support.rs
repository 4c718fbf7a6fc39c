//! Test-only fixtures shared across unit tests in this crate.

use std::sync::Arc;
use std::time::Duration;

use crate::events::EventHub;
use crate::pipeline::PipelineContext;
use crate::repository::{JobRepository, PipelineEventRepository, RecordRepository};
use crate::storage::BlobStore;

/// Build a `PipelineContext` over fresh in-memory/temp-dir backends. Each
/// call is fully isolated from the others; the in-memory record repository
/// leaves foreign keys unenforced so callers can upsert records against
/// archive id 1 without seeding an `archives` row first.
pub fn test_context() -> PipelineContext {
    let records = Arc::new(RecordRepository::in_memory().expect("in-memory records repo"));
    let jobs = Arc::new(JobRepository::in_memory().expect("in-memory jobs repo"));
    let events_log =
        Arc::new(PipelineEventRepository::in_memory().expect("in-memory pipeline event repo"));

    let tmp = tempfile::tempdir().expect("temp blob dir").into_path();
    let blobs = Arc::new(BlobStore::new(tmp));
    let hub = Arc::new(EventHub::new(Duration::from_secs(30 * 60)));

    PipelineContext {
        records,
        jobs,
        events_log,
        blobs,
        hub,
    }
}
