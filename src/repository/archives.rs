//! Archive (top-level source) persistence.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::models::Archive;

use super::{connect, parse_datetime, schema, Result};

pub struct ArchiveRepository {
    conn: Mutex<Connection>,
}

impl ArchiveRepository {
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

    fn row_to_archive(row: &rusqlite::Row) -> rusqlite::Result<Archive> {
        Ok(Archive {
            id: row.get("id")?,
            name: row.get("name")?,
            country: row.get("country")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        })
    }

    pub fn get_or_create(&self, name: &str, country: Option<&str>) -> Result<Archive> {
        let conn = self.conn.lock().unwrap();
        if let Some(archive) = conn
            .query_row(
                "SELECT * FROM archives WHERE name = ?1",
                params![name],
                Self::row_to_archive,
            )
            .optional()?
        {
            return Ok(archive);
        }

        conn.execute(
            "INSERT INTO archives (name, country) VALUES (?1, ?2)",
            params![name, country],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT * FROM archives WHERE id = ?1",
            params![id],
            Self::row_to_archive,
        )
        .map_err(Into::into)
    }

    pub fn get(&self, id: i64) -> Result<Option<Archive>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM archives WHERE id = ?1",
            params![id],
            Self::row_to_archive,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list(&self) -> Result<Vec<Archive>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM archives ORDER BY name ASC")?;
        let rows = stmt
            .query_map([], Self::row_to_archive)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent() {
        let repo = ArchiveRepository::in_memory().unwrap();
        let a = repo.get_or_create("NARA", Some("US")).unwrap();
        let b = repo.get_or_create("NARA", Some("US")).unwrap();
        assert_eq!(a.id, b.id);
    }
}
