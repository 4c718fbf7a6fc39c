use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a [`Record`]. Transitions are defined in
/// `crate::pipeline` and are always conditional on the expected prior
/// status; illegal transitions are silent no-ops rather than errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Ingesting,
    OcrPending,
    OcrDone,
    PdfPending,
    PdfDone,
    Translating,
    Complete,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingesting => "ingesting",
            Self::OcrPending => "ocr_pending",
            Self::OcrDone => "ocr_done",
            Self::PdfPending => "pdf_pending",
            Self::PdfDone => "pdf_done",
            Self::Translating => "translating",
            Self::Complete => "complete",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ingesting" => Some(Self::Ingesting),
            "ocr_pending" => Some(Self::OcrPending),
            "ocr_done" => Some(Self::OcrDone),
            "pdf_pending" => Some(Self::PdfPending),
            "pdf_done" => Some(Self::PdfDone),
            "translating" => Some(Self::Translating),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// One archival document: a logical folder of scanned pages plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub archive_id: i64,
    pub source_system: String,
    pub source_record_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    /// 2-char ISO-639-1 code for the language of the page content.
    pub lang: Option<String>,
    /// 2-char ISO-639-1 code for the language of the cataloging metadata.
    pub metadata_lang: Option<String>,
    pub status: RecordStatus,
    pub page_count: i64,
    pub attachment_count: i64,
    pub pdf_attachment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validate a 2-char ISO-639-1 style language code.
pub fn is_valid_lang_code(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            RecordStatus::Ingesting,
            RecordStatus::OcrPending,
            RecordStatus::OcrDone,
            RecordStatus::PdfPending,
            RecordStatus::PdfDone,
            RecordStatus::Translating,
            RecordStatus::Complete,
        ] {
            assert_eq!(RecordStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_status_string_is_none() {
        assert_eq!(RecordStatus::from_str("bogus"), None);
    }

    #[test]
    fn only_complete_is_terminal() {
        assert!(RecordStatus::Complete.is_terminal());
        assert!(!RecordStatus::PdfDone.is_terminal());
    }

    #[test]
    fn lang_code_validation() {
        assert!(is_valid_lang_code("de"));
        assert!(!is_valid_lang_code("deu"));
        assert!(!is_valid_lang_code("1e"));
        assert!(!is_valid_lang_code(""));
    }
}
