use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An append-only audit-log row recording a stage transition. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub id: i64,
    pub record_id: i64,
    pub stage: String,
    pub event: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}
