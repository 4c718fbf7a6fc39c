//! Archive ingest and pipeline orchestration core.
//!
//! This crate is the single-leader orchestrator described in the design
//! docs: a record/job state machine, an HTTP surface for scrapers and
//! workers, an SSE event hub, worker/scraper presence tracking, and a
//! self-healing audit engine. See `crate::pipeline` for the orchestration
//! logic and `crate::server` for the HTTP surface.

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod pipeline;
pub mod presence;
pub mod repository;
pub mod storage;

#[cfg(test)]
pub mod test_support;
