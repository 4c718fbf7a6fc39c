use chrono::{DateTime, Utc};
use serde::Serialize;

/// In-memory liveness record for a worker. Not persisted: it is fully
/// reconstructable from the next round of heartbeats after a restart.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerPresence {
    pub worker_id: String,
    pub kinds: Vec<String>,
    pub last_seen: DateTime<Utc>,
}

impl WorkerPresence {
    pub fn is_alive(&self, now: DateTime<Utc>, ttl_secs: i64) -> bool {
        (now - self.last_seen).num_seconds() <= ttl_secs
    }
}

/// In-memory liveness record for a scraper session.
#[derive(Debug, Clone, Serialize)]
pub struct ScraperPresence {
    pub source_system: String,
    pub last_seen: DateTime<Utc>,
    pub records_ingested: u64,
    pub pages_ingested: u64,
}

impl ScraperPresence {
    pub fn is_alive(&self, now: DateTime<Utc>, ttl_secs: i64) -> bool {
        (now - self.last_seen).num_seconds() <= ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn worker_presence_expires_after_ttl() {
        let now = Utc::now();
        let presence = WorkerPresence {
            worker_id: "w1".to_string(),
            kinds: vec!["ocr_page_paddle".to_string()],
            last_seen: now - Duration::seconds(61),
        };
        assert!(!presence.is_alive(now, 60));
        assert!(presence.is_alive(now, 120));
    }

    #[test]
    fn scraper_presence_has_longer_ttl() {
        let now = Utc::now();
        let presence = ScraperPresence {
            source_system: "nara".to_string(),
            last_seen: now - Duration::seconds(80),
            records_ingested: 4,
            pages_ingested: 40,
        };
        assert!(presence.is_alive(now, 90));
        assert!(!presence.is_alive(now, 60));
    }
}
