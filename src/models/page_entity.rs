use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named entity extracted from a page's OCR/translated text by a worker's
/// entity-recognition step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEntity {
    pub id: i64,
    pub page_id: i64,
    pub kind: String,
    pub value: String,
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}
