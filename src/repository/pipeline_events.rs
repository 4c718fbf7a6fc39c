//! Append-only pipeline event log.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::models::PipelineEvent;

use super::{connect, parse_datetime, schema, Result};

pub struct PipelineEventRepository {
    conn: Mutex<Connection>,
}

impl PipelineEventRepository {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = connect(db_path)?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<PipelineEvent> {
        Ok(PipelineEvent {
            id: row.get("id")?,
            record_id: row.get("record_id")?,
            stage: row.get("stage")?,
            event: row.get("event")?,
            detail: row.get("detail")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        })
    }

    pub fn log(
        &self,
        record_id: i64,
        stage: &str,
        event: &str,
        detail: Option<&str>,
    ) -> Result<PipelineEvent> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO pipeline_events (record_id, stage, event, detail) VALUES (?1, ?2, ?3, ?4)",
            params![record_id, stage, event, detail],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT * FROM pipeline_events WHERE id = ?1",
            params![id],
            Self::row_to_event,
        )
        .map_err(Into::into)
    }

    pub fn for_record(&self, record_id: i64) -> Result<Vec<PipelineEvent>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM pipeline_events WHERE record_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![record_id], Self::row_to_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn has_event(&self, record_id: i64, stage: &str, event: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pipeline_events WHERE record_id = ?1 AND stage = ?2 AND event = ?3",
            params![record_id, stage, event],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_and_read_back() {
        let repo = PipelineEventRepository::in_memory().unwrap();
        repo.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO archives (id, name) VALUES (1, 'a')",
                [],
            )
            .unwrap();
        repo.conn
            .lock()
            .unwrap()
            .execute(
                "INSERT INTO records (id, archive_id, source_system, source_record_id) VALUES (1, 1, 's', 'r')",
                [],
            )
            .unwrap();
        repo.log(1, "ingest", "started", None).unwrap();
        let events = repo.for_record(1).unwrap();
        assert_eq!(events.len(), 1);
        assert!(repo.has_event(1, "ingest", "started").unwrap());
        assert!(!repo.has_event(1, "ocr", "completed").unwrap());
    }
}
