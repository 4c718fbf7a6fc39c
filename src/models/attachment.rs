use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a blob attached to a record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentRole {
    PageImage,
    OriginalPdf,
    SearchablePdf,
    OcrArtifact,
}

impl AttachmentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageImage => "page_image",
            Self::OriginalPdf => "original_pdf",
            Self::SearchablePdf => "searchable_pdf",
            Self::OcrArtifact => "ocr_artifact",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "page_image" => Some(Self::PageImage),
            "original_pdf" => Some(Self::OriginalPdf),
            "searchable_pdf" => Some(Self::SearchablePdf),
            "ocr_artifact" => Some(Self::OcrArtifact),
            _ => None,
        }
    }
}

/// A byte blob associated with a record (an image, a PDF, or a derivative).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub record_id: i64,
    pub role: AttachmentRole,
    pub path: String,
    pub sha256: String,
    pub mime: String,
    pub byte_size: i64,
    pub created_at: DateTime<Utc>,
}
