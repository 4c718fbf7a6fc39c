//! Record, page, attachment, and page-text persistence.
//!
//! This is the busiest repository in the crate: it owns the record status
//! state machine's storage (conditional updates guarded by expected prior
//! status) as well as the page/attachment/page-text tables that feed it.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    Attachment, AttachmentRole, Page, PageEntity, PageText, Record, RecordStatus,
};

use super::{connect, parse_datetime, schema, Result};

/// Bytes plus the metadata needed to persist an attachment.
pub struct AttachmentInput {
    pub bytes: Vec<u8>,
    pub mime: String,
}

#[derive(Debug, Default, Clone)]
pub struct RecordFilter {
    pub archive_id: Option<i64>,
    pub status: Option<RecordStatus>,
    pub limit: i64,
    pub offset: i64,
}

pub struct RecordRepository {
    conn: Mutex<Connection>,
}

impl RecordRepository {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = connect(db_path)?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// An in-memory database for tests. Foreign keys are left unenforced
    /// here so fixtures don't need to seed an `archives` row for every
    /// record they create.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<Record> {
        let status_str: String = row.get("status")?;
        Ok(Record {
            id: row.get("id")?,
            archive_id: row.get("archive_id")?,
            source_system: row.get("source_system")?,
            source_record_id: row.get("source_record_id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            date_start: row.get("date_start")?,
            date_end: row.get("date_end")?,
            lang: row.get("lang")?,
            metadata_lang: row.get("metadata_lang")?,
            status: RecordStatus::from_str(&status_str).unwrap_or(RecordStatus::Ingesting),
            page_count: row.get("page_count")?,
            attachment_count: row.get("attachment_count")?,
            pdf_attachment_id: row.get("pdf_attachment_id")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
            updated_at: parse_datetime(&row.get::<_, String>("updated_at")?),
        })
    }

    /// Create or update a record keyed on (source_system, source_record_id).
    /// Never demotes status: on conflict only the descriptive fields are
    /// updated, leaving status, page_count, and pdf_attachment_id alone.
    pub fn upsert_record(
        &self,
        archive_id: i64,
        source_system: &str,
        source_record_id: &str,
        title: Option<&str>,
        description: Option<&str>,
        date_start: Option<&str>,
        date_end: Option<&str>,
        lang: Option<&str>,
        metadata_lang: Option<&str>,
    ) -> Result<(Record, bool)> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();

        conn.execute(
            r#"
            INSERT INTO records (
                archive_id, source_system, source_record_id, title, description,
                date_start, date_end, lang, metadata_lang, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'ingesting', ?10, ?10)
            ON CONFLICT (source_system, source_record_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                date_start = excluded.date_start,
                date_end = excluded.date_end,
                lang = excluded.lang,
                metadata_lang = excluded.metadata_lang,
                updated_at = excluded.updated_at
            "#,
            params![
                archive_id,
                source_system,
                source_record_id,
                title,
                description,
                date_start,
                date_end,
                lang,
                metadata_lang,
                now,
            ],
        )?;

        let record = self
            .get_by_source(source_system, source_record_id)?
            .expect("just upserted");
        let created = record.created_at == record.updated_at;
        Ok((record, created))
    }

    pub fn get(&self, record_id: i64) -> Result<Option<Record>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM records WHERE id = ?1",
            params![record_id],
            Self::row_to_record,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn get_by_source(
        &self,
        source_system: &str,
        source_record_id: &str,
    ) -> Result<Option<Record>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM records WHERE source_system = ?1 AND source_record_id = ?2",
            params![source_system, source_record_id],
            Self::row_to_record,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list(&self, filter: &RecordFilter) -> Result<(Vec<Record>, u64)> {
        let conn = self.conn.lock().unwrap();

        let mut where_clauses: Vec<String> = Vec::new();
        let mut query_params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(archive_id) = filter.archive_id {
            where_clauses.push("archive_id = ?".to_string());
            query_params.push(Box::new(archive_id));
        }
        if let Some(status) = filter.status {
            where_clauses.push("status = ?".to_string());
            query_params.push(Box::new(status.as_str().to_string()));
        }

        let where_sql = if where_clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", where_clauses.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM records {where_sql}");
        let total: i64 = conn.query_row(
            &count_sql,
            rusqlite::params_from_iter(query_params.iter().map(|p| p.as_ref())),
            |row| row.get(0),
        )?;

        let limit = filter.limit.max(1);
        let offset = filter.offset.max(0);
        let list_sql = format!(
            "SELECT * FROM records {where_sql} ORDER BY updated_at DESC LIMIT {limit} OFFSET {offset}"
        );

        let mut stmt = conn.prepare(&list_sql)?;
        let rows = stmt
            .query_map(
                rusqlite::params_from_iter(query_params.iter().map(|p| p.as_ref())),
                Self::row_to_record,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total.max(0) as u64))
    }

    /// Conditionally transition a record's status. Returns whether the
    /// transition was applied (false means the expected-from status did not
    /// match — a no-op, not an error).
    pub fn transition_status(
        &self,
        record_id: i64,
        from: RecordStatus,
        to: RecordStatus,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let affected = conn.execute(
            "UPDATE records SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
            params![to.as_str(), now, record_id, from.as_str()],
        )?;
        Ok(affected > 0)
    }

    /// Reset a record to `ingesting`, clearing its PDF reference while
    /// keeping pages and any existing page text.
    pub fn repair(&self, record_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE records SET status = 'ingesting', pdf_attachment_id = NULL, updated_at = ?1 WHERE id = ?2",
            params![now, record_id],
        )?;
        Ok(())
    }

    pub fn set_pdf_attachment(&self, record_id: i64, attachment_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE records SET pdf_attachment_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![attachment_id, now, record_id],
        )?;
        Ok(())
    }

    /// Null the PDF back-pointer before deleting the record, breaking the
    /// record <-> attachment cycle.
    pub fn delete_record(&self, record_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE records SET pdf_attachment_id = NULL WHERE id = ?1",
            params![record_id],
        )?;
        let affected = conn.execute("DELETE FROM records WHERE id = ?1", params![record_id])?;
        if affected == 0 {
            return Err(super::RepositoryError::NotFound(format!(
                "record {record_id}"
            )));
        }
        Ok(())
    }

    // -- attachments --------------------------------------------------

    fn row_to_attachment(row: &rusqlite::Row) -> rusqlite::Result<Attachment> {
        let role_str: String = row.get("role")?;
        Ok(Attachment {
            id: row.get("id")?,
            record_id: row.get("record_id")?,
            role: AttachmentRole::from_str(&role_str).unwrap_or(AttachmentRole::OcrArtifact),
            path: row.get("path")?,
            sha256: row.get("sha256")?,
            mime: row.get("mime")?,
            byte_size: row.get("byte_size")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        })
    }

    pub fn insert_attachment(
        &self,
        record_id: i64,
        role: AttachmentRole,
        path: &str,
        sha256: &str,
        mime: &str,
        byte_size: i64,
    ) -> Result<Attachment> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO attachments (record_id, role, path, sha256, mime, byte_size) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![record_id, role.as_str(), path, sha256, mime, byte_size],
        )?;
        let id = conn.last_insert_rowid();
        conn.execute(
            "UPDATE records SET attachment_count = attachment_count + 1 WHERE id = ?1",
            params![record_id],
        )?;
        conn.query_row(
            "SELECT * FROM attachments WHERE id = ?1",
            params![id],
            Self::row_to_attachment,
        )
        .map_err(Into::into)
    }

    pub fn get_attachment(&self, attachment_id: i64) -> Result<Option<Attachment>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM attachments WHERE id = ?1",
            params![attachment_id],
            Self::row_to_attachment,
        )
        .optional()
        .map_err(Into::into)
    }

    /// The most recently created attachment of a role for a record.
    pub fn latest_attachment_by_role(
        &self,
        record_id: i64,
        role: AttachmentRole,
    ) -> Result<Option<Attachment>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM attachments WHERE record_id = ?1 AND role = ?2 ORDER BY created_at DESC, id DESC LIMIT 1",
            params![record_id, role.as_str()],
            Self::row_to_attachment,
        )
        .optional()
        .map_err(Into::into)
    }

    // -- pages ----------------------------------------------------------

    fn row_to_page(row: &rusqlite::Row) -> rusqlite::Result<Page> {
        Ok(Page {
            id: row.get("id")?,
            record_id: row.get("record_id")?,
            seq: row.get("seq")?,
            image_attachment_id: row.get("image_attachment_id")?,
            label: row.get("label")?,
            width: row.get("width")?,
            height: row.get("height")?,
            source_url: row.get("source_url")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        })
    }

    /// Insert or replace the page at (record_id, seq); re-uploading a page
    /// overwrites its image attachment and metadata in place.
    pub fn upsert_page(
        &self,
        record_id: i64,
        seq: i32,
        image_attachment_id: i64,
        label: Option<&str>,
        width: Option<i32>,
        height: Option<i32>,
        source_url: Option<&str>,
    ) -> Result<Page> {
        let conn = self.conn.lock().unwrap();
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM pages WHERE record_id = ?1 AND seq = ?2",
                params![record_id, seq],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_none() {
            conn.execute(
                "INSERT INTO pages (record_id, seq, image_attachment_id, label, width, height, source_url) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![record_id, seq, image_attachment_id, label, width, height, source_url],
            )?;
            conn.execute(
                "UPDATE records SET page_count = page_count + 1 WHERE id = ?1",
                params![record_id],
            )?;
        } else {
            conn.execute(
                "UPDATE pages SET image_attachment_id = ?1, label = ?2, width = ?3, height = ?4, source_url = ?5 WHERE record_id = ?6 AND seq = ?7",
                params![image_attachment_id, label, width, height, source_url, record_id, seq],
            )?;
        }

        conn.query_row(
            "SELECT * FROM pages WHERE record_id = ?1 AND seq = ?2",
            params![record_id, seq],
            Self::row_to_page,
        )
        .map_err(Into::into)
    }

    pub fn get_pages(&self, record_id: i64) -> Result<Vec<Page>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM pages WHERE record_id = ?1 ORDER BY seq ASC")?;
        let rows = stmt
            .query_map(params![record_id], Self::row_to_page)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_page(&self, page_id: i64) -> Result<Option<Page>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM pages WHERE id = ?1",
            params![page_id],
            Self::row_to_page,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Pages with no page_text row at all — the set that still needs OCR.
    pub fn pages_without_text(&self, record_id: i64) -> Result<Vec<Page>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT p.* FROM pages p LEFT JOIN page_text pt ON pt.page_id = p.id WHERE p.record_id = ?1 AND pt.id IS NULL ORDER BY p.seq ASC",
        )?;
        let rows = stmt
            .query_map(params![record_id], Self::row_to_page)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_pages_without_text(&self, record_id: i64) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pages p LEFT JOIN page_text pt ON pt.page_id = p.id WHERE p.record_id = ?1 AND pt.id IS NULL",
            params![record_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // -- page text --------------------------------------------------------

    fn row_to_page_text(row: &rusqlite::Row) -> rusqlite::Result<PageText> {
        Ok(PageText {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            engine: row.get("engine")?,
            confidence: row.get("confidence")?,
            text_raw: row.get("text_raw")?,
            text_en: row.get("text_en")?,
            hocr: row.get("hocr")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        })
    }

    pub fn insert_page_text(
        &self,
        page_id: i64,
        engine: &str,
        confidence: Option<f64>,
        text_raw: &str,
        text_en: Option<&str>,
        hocr: Option<&str>,
    ) -> Result<PageText> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO page_text (page_id, engine, confidence, text_raw, text_en, hocr) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![page_id, engine, confidence, text_raw, text_en, hocr],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT * FROM page_text WHERE id = ?1",
            params![id],
            Self::row_to_page_text,
        )
        .map_err(Into::into)
    }

    pub fn get_page_texts(&self, page_id: i64) -> Result<Vec<PageText>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM page_text WHERE page_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![page_id], Self::row_to_page_text)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Join the highest-confidence page_text row for every page of a
    /// record, in page order.
    pub fn combined_record_text(&self, record_id: i64) -> Result<String> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            r#"
            SELECT (
                SELECT pt.text_raw FROM page_text pt
                WHERE pt.page_id = p.id
                ORDER BY pt.confidence IS NULL, pt.confidence DESC
                LIMIT 1
            ) AS text
            FROM pages p
            WHERE p.record_id = ?1
            ORDER BY p.seq ASC
            "#,
        )?;
        let parts = stmt
            .query_map(params![record_id], |row| row.get::<_, Option<String>>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(parts.into_iter().flatten().collect::<Vec<_>>().join("\n\n"))
    }

    // -- page entities ----------------------------------------------------

    fn row_to_page_entity(row: &rusqlite::Row) -> rusqlite::Result<PageEntity> {
        Ok(PageEntity {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            kind: row.get("kind")?,
            value: row.get("value")?,
            confidence: row.get("confidence")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
        })
    }

    pub fn insert_entity(
        &self,
        page_id: i64,
        kind: &str,
        value: &str,
        confidence: Option<f64>,
    ) -> Result<PageEntity> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO page_entities (page_id, kind, value, confidence) VALUES (?1, ?2, ?3, ?4)",
            params![page_id, kind, value, confidence],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT * FROM page_entities WHERE id = ?1",
            params![id],
            Self::row_to_page_entity,
        )
        .map_err(Into::into)
    }

    pub fn get_entities_for_page(&self, page_id: i64) -> Result<Vec<PageEntity>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM page_entities WHERE page_id = ?1 ORDER BY created_at ASC",
        )?;
        let rows = stmt
            .query_map(params![page_id], Self::row_to_page_entity)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Keyword search over record titles/descriptions and page text, scoped
    /// to an optional archive. Matches the same pagination shape as `list`.
    pub fn search(
        &self,
        keyword: &str,
        archive_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Record>, u64)> {
        let conn = self.conn.lock().unwrap();
        let like = format!("%{keyword}%");

        let archive_clause = if archive_id.is_some() {
            "AND r.archive_id = ?4"
        } else {
            ""
        };

        let count_sql = format!(
            r#"
            SELECT COUNT(DISTINCT r.id) FROM records r
            LEFT JOIN pages p ON p.record_id = r.id
            LEFT JOIN page_text pt ON pt.page_id = p.id
            WHERE (r.title LIKE ?1 OR r.description LIKE ?1 OR pt.text_raw LIKE ?1)
            {archive_clause}
            "#
        );
        let list_sql = format!(
            r#"
            SELECT DISTINCT r.* FROM records r
            LEFT JOIN pages p ON p.record_id = r.id
            LEFT JOIN page_text pt ON pt.page_id = p.id
            WHERE (r.title LIKE ?1 OR r.description LIKE ?1 OR pt.text_raw LIKE ?1)
            {archive_clause}
            ORDER BY r.updated_at DESC LIMIT ?2 OFFSET ?3
            "#
        );

        let limit = limit.max(1);
        let offset = offset.max(0);

        let total: i64 = match archive_id {
            Some(aid) => conn.query_row(&count_sql, params![like, limit, offset, aid], |row| {
                row.get(0)
            })?,
            None => conn.query_row(&count_sql, params![like, limit, offset], |row| row.get(0))?,
        };

        let mut stmt = conn.prepare(&list_sql)?;
        let rows = match archive_id {
            Some(aid) => stmt
                .query_map(params![like, limit, offset, aid], Self::row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map(params![like, limit, offset], Self::row_to_record)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };

        Ok((rows, total.max(0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RecordRepository {
        let repo = RecordRepository::in_memory().unwrap();
        repo.conn
            .lock()
            .unwrap()
            .execute("INSERT INTO archives (id, name) VALUES (1, 'Test Archive')", [])
            .unwrap();
        repo
    }

    #[test]
    fn upsert_is_idempotent_by_source_key() {
        let repo = repo();
        let (r1, created1) = repo
            .upsert_record(1, "nara", "abc", Some("Title"), None, None, None, Some("de"), Some("en"))
            .unwrap();
        assert!(created1);
        let (r2, created2) = repo
            .upsert_record(1, "nara", "abc", Some("Updated"), None, None, None, Some("de"), Some("en"))
            .unwrap();
        assert_eq!(r1.id, r2.id);
        assert!(!created2);
        assert_eq!(r2.title.as_deref(), Some("Updated"));
        assert_eq!(r2.status, RecordStatus::Ingesting);
    }

    #[test]
    fn transition_is_noop_on_status_mismatch() {
        let repo = repo();
        let (record, _) = repo
            .upsert_record(1, "nara", "abc", None, None, None, None, None, None)
            .unwrap();
        let applied = repo
            .transition_status(record.id, RecordStatus::OcrPending, RecordStatus::OcrDone)
            .unwrap();
        assert!(!applied);
        let reloaded = repo.get(record.id).unwrap().unwrap();
        assert_eq!(reloaded.status, RecordStatus::Ingesting);
    }

    #[test]
    fn transition_applies_on_matching_status() {
        let repo = repo();
        let (record, _) = repo
            .upsert_record(1, "nara", "abc", None, None, None, None, None, None)
            .unwrap();
        let applied = repo
            .transition_status(record.id, RecordStatus::Ingesting, RecordStatus::OcrPending)
            .unwrap();
        assert!(applied);
        let reloaded = repo.get(record.id).unwrap().unwrap();
        assert_eq!(reloaded.status, RecordStatus::OcrPending);
    }

    #[test]
    fn page_upsert_increments_page_count_once() {
        let repo = repo();
        let (record, _) = repo
            .upsert_record(1, "nara", "abc", None, None, None, None, None, None)
            .unwrap();
        let attachment = repo
            .insert_attachment(record.id, AttachmentRole::PageImage, "p.jpg", "sha", "image/jpeg", 10)
            .unwrap();
        repo.upsert_page(record.id, 1, attachment.id, None, None, None, None)
            .unwrap();
        repo.upsert_page(record.id, 1, attachment.id, None, None, None, None)
            .unwrap();
        let reloaded = repo.get(record.id).unwrap().unwrap();
        assert_eq!(reloaded.page_count, 1);
    }

    #[test]
    fn pages_without_text_excludes_ocred_pages() {
        let repo = repo();
        let (record, _) = repo
            .upsert_record(1, "nara", "abc", None, None, None, None, None, None)
            .unwrap();
        let a1 = repo
            .insert_attachment(record.id, AttachmentRole::PageImage, "p1.jpg", "s1", "image/jpeg", 10)
            .unwrap();
        let a2 = repo
            .insert_attachment(record.id, AttachmentRole::PageImage, "p2.jpg", "s2", "image/jpeg", 10)
            .unwrap();
        let p1 = repo
            .upsert_page(record.id, 1, a1.id, None, None, None, None)
            .unwrap();
        repo.upsert_page(record.id, 2, a2.id, None, None, None, None)
            .unwrap();
        repo.insert_page_text(p1.id, "paddle", Some(0.9), "hello", None, None)
            .unwrap();

        let remaining = repo.pages_without_text(record.id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].seq, 2);
        assert_eq!(repo.count_pages_without_text(record.id).unwrap(), 1);
    }

    #[test]
    fn delete_record_breaks_pdf_cycle_first() {
        let repo = repo();
        let (record, _) = repo
            .upsert_record(1, "nara", "abc", None, None, None, None, None, None)
            .unwrap();
        let attachment = repo
            .insert_attachment(record.id, AttachmentRole::OriginalPdf, "r.pdf", "sha", "application/pdf", 100)
            .unwrap();
        repo.set_pdf_attachment(record.id, attachment.id).unwrap();
        repo.delete_record(record.id).unwrap();
        assert!(repo.get(record.id).unwrap().is_none());
    }
}
