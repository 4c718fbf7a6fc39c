use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`Job`]. `pending -> claimed -> {completed | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Claimed,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "claimed" => Some(Self::Claimed),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A queued unit of work for an external worker process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub kind: String,
    pub record_id: Option<i64>,
    pub page_id: Option<i64>,
    /// Opaque JSON payload; only the worker that handles `kind` interprets it.
    pub payload: Option<String>,
    pub status: JobStatus,
    pub attempts: i64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Job kind prefixes used by the stage-completion hook (`crate::pipeline`)
/// to route a finished job to the right follow-up check.
pub mod kinds {
    pub const OCR_PAGE_PREFIX: &str = "ocr_page_";
    pub const OCR_PAGE_PADDLE: &str = "ocr_page_paddle";
    pub const BUILD_SEARCHABLE_PDF: &str = "build_searchable_pdf";
    pub const TRANSLATE_PAGE: &str = "translate_page";
    pub const TRANSLATE_RECORD: &str = "translate_record";
    pub const EMBED_RECORD: &str = "embed_record";

    pub fn is_translation(kind: &str) -> bool {
        kind == TRANSLATE_PAGE || kind == TRANSLATE_RECORD
    }
}
