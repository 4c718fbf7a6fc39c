//! In-memory, TTL-based liveness tracking for workers and scrapers.
//!
//! Neither registry is persisted: both are fully reconstructable from the
//! next round of heartbeats, so a restart just means a TTL-length blind
//! spot in the UI's "workers online" dashboard, not lost data.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::{ScraperPresence, WorkerPresence};

#[derive(Clone)]
pub struct WorkerRegistry {
    ttl_secs: i64,
    workers: Arc<RwLock<HashMap<String, WorkerPresence>>>,
}

impl WorkerRegistry {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl_secs,
            workers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn heartbeat(&self, worker_id: &str, kinds: Vec<String>) {
        let mut workers = self.workers.write().await;
        workers.insert(
            worker_id.to_string(),
            WorkerPresence {
                worker_id: worker_id.to_string(),
                kinds,
                last_seen: Utc::now(),
            },
        );
    }

    /// Workers seen within the TTL window.
    pub async fn alive(&self) -> Vec<WorkerPresence> {
        let now = Utc::now();
        let workers = self.workers.read().await;
        workers
            .values()
            .filter(|w| w.is_alive(now, self.ttl_secs))
            .cloned()
            .collect()
    }

    /// Count of alive workers advertising a given job kind.
    pub async fn alive_count_for_kind(&self, kind: &str) -> usize {
        self.alive()
            .await
            .into_iter()
            .filter(|w| w.kinds.iter().any(|k| k == kind))
            .count()
    }
}

#[derive(Clone)]
pub struct ScraperRegistry {
    ttl_secs: i64,
    scrapers: Arc<RwLock<HashMap<String, ScraperPresence>>>,
}

impl ScraperRegistry {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl_secs,
            scrapers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn heartbeat(&self, source_system: &str, records_ingested: u64, pages_ingested: u64) {
        let mut scrapers = self.scrapers.write().await;
        scrapers.insert(
            source_system.to_string(),
            ScraperPresence {
                source_system: source_system.to_string(),
                last_seen: Utc::now(),
                records_ingested,
                pages_ingested,
            },
        );
    }

    pub async fn alive(&self) -> Vec<ScraperPresence> {
        let now = Utc::now();
        let scrapers = self.scrapers.read().await;
        scrapers
            .values()
            .filter(|s| s.is_alive(now, self.ttl_secs))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn worker_registry_tracks_alive_kinds() {
        let registry = WorkerRegistry::new(60);
        registry
            .heartbeat("w1", vec!["ocr_page_paddle".to_string()])
            .await;
        assert_eq!(registry.alive_count_for_kind("ocr_page_paddle").await, 1);
        assert_eq!(registry.alive_count_for_kind("translate_page").await, 0);
    }

    #[tokio::test]
    async fn reheartbeat_supersedes_prior_kinds() {
        let registry = WorkerRegistry::new(60);
        registry.heartbeat("w1", vec!["a".to_string()]).await;
        registry.heartbeat("w1", vec!["b".to_string()]).await;
        let alive = registry.alive().await;
        assert_eq!(alive.len(), 1);
        assert_eq!(alive[0].kinds, vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn scraper_registry_tracks_counters() {
        let registry = ScraperRegistry::new(90);
        registry.heartbeat("nara", 3, 30).await;
        let alive = registry.alive().await;
        assert_eq!(alive[0].records_ingested, 3);
    }
}
