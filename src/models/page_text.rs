use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OCR (or extracted-text) output for a single page. A page may accumulate
/// several of these across engines/retries; the best one is the one with the
/// highest confidence, treating a missing confidence as the lowest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    pub id: i64,
    pub page_id: i64,
    pub engine: String,
    pub confidence: Option<f64>,
    pub text_raw: String,
    pub text_en: Option<String>,
    pub hocr: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Pick the best of several page_text rows for one page by confidence, with
/// `None` sorting below any `Some`.
pub fn best<'a>(candidates: &'a [PageText]) -> Option<&'a PageText> {
    candidates.iter().max_by(|a, b| {
        a.confidence
            .unwrap_or(f64::MIN)
            .partial_cmp(&b.confidence.unwrap_or(f64::MIN))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: i64, confidence: Option<f64>) -> PageText {
        PageText {
            id,
            page_id: 1,
            engine: "test".to_string(),
            confidence,
            text_raw: format!("text-{id}"),
            text_en: None,
            hocr: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn best_picks_highest_confidence() {
        let rows = vec![sample(1, Some(0.5)), sample(2, Some(0.9)), sample(3, Some(0.2))];
        assert_eq!(best(&rows).unwrap().id, 2);
    }

    #[test]
    fn best_treats_missing_confidence_as_lowest() {
        let rows = vec![sample(1, None), sample(2, Some(0.1))];
        assert_eq!(best(&rows).unwrap().id, 2);
    }

    #[test]
    fn best_of_empty_is_none() {
        assert!(best(&[]).is_none());
    }
}
