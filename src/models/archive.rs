use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A top-level source of archival records, e.g. a national archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archive {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
}
