use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scanned leaf within a [`crate::models::Record`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub record_id: i64,
    /// 1-based ordinal, unique per record.
    pub seq: i32,
    pub image_attachment_id: i64,
    pub label: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Deterministic blob-store path for a page image.
pub fn page_image_path(record_id: i64, seq: i32) -> String {
    format!("records/{record_id}/attachments/pages/p{seq:04}.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_paths_are_zero_padded() {
        assert_eq!(page_image_path(7, 3), "records/7/attachments/pages/p0003.jpg");
        assert_eq!(
            page_image_path(7, 10000),
            "records/7/attachments/pages/p10000.jpg"
        );
    }
}
