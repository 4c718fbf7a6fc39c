//! Job queue persistence: enqueue, atomic claim, complete, fail.
//!
//! `claim` is the one place in the crate where two concurrent callers must
//! never observe the same row. It wraps a `SELECT` + `UPDATE` pair in a
//! `BEGIN IMMEDIATE` transaction, which acquires the single writer lock
//! before the read, so a second claimer blocks (and then sees the row
//! already `claimed`) rather than racing.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Job, JobStatus};

use super::{connect, parse_datetime, parse_datetime_opt, schema, Result};

pub struct JobRepository {
    conn: Mutex<Connection>,
}

impl JobRepository {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = connect(db_path)?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// An in-memory database for tests. Each repository's in-memory
    /// connection is its own isolated database (there is no shared backing
    /// file to hold it to), so foreign keys across tables owned by other
    /// repositories are deliberately left unenforced here.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_job(row: &rusqlite::Row) -> rusqlite::Result<Job> {
        let status_str: String = row.get("status")?;
        Ok(Job {
            id: row.get("id")?,
            kind: row.get("kind")?,
            record_id: row.get("record_id")?,
            page_id: row.get("page_id")?,
            payload: row.get("payload")?,
            status: JobStatus::from_str(&status_str).unwrap_or(JobStatus::Pending),
            attempts: row.get("attempts")?,
            error: row.get("error")?,
            created_at: parse_datetime(&row.get::<_, String>("created_at")?),
            started_at: parse_datetime_opt(row.get("started_at")?),
            finished_at: parse_datetime_opt(row.get("finished_at")?),
        })
    }

    pub fn enqueue(
        &self,
        kind: &str,
        record_id: Option<i64>,
        page_id: Option<i64>,
        payload: Option<&str>,
    ) -> Result<Job> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO jobs (kind, record_id, page_id, payload) VALUES (?1, ?2, ?3, ?4)",
            params![kind, record_id, page_id, payload],
        )?;
        let id = conn.last_insert_rowid();
        conn.query_row(
            "SELECT * FROM jobs WHERE id = ?1",
            params![id],
            Self::row_to_job,
        )
        .map_err(Into::into)
    }

    pub fn get(&self, job_id: i64) -> Result<Option<Job>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM jobs WHERE id = ?1",
            params![job_id],
            Self::row_to_job,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Atomically claim the oldest pending job of `kind`, or `None` if there
    /// is nothing pending. No two concurrent callers ever receive the same
    /// job id.
    pub fn claim(&self, kind: &str) -> Result<Option<Job>> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let job_id: Option<i64> = tx
            .query_row(
                "SELECT id FROM jobs WHERE kind = ?1 AND status = 'pending' ORDER BY created_at ASC, id ASC LIMIT 1",
                params![kind],
                |row| row.get(0),
            )
            .optional()?;

        let Some(job_id) = job_id else {
            tx.commit()?;
            return Ok(None);
        };

        let now = Utc::now().to_rfc3339();
        let affected = tx.execute(
            "UPDATE jobs SET status = 'claimed', attempts = attempts + 1, started_at = ?1 WHERE id = ?2 AND status = 'pending'",
            params![now, job_id],
        )?;

        if affected == 0 {
            // Lost the race to another claimer between the select and the
            // update (should not happen under BEGIN IMMEDIATE, but the
            // check keeps the invariant true even under a weaker isolation
            // level).
            tx.rollback()?;
            return Ok(None);
        }

        let job = tx.query_row(
            "SELECT * FROM jobs WHERE id = ?1",
            params![job_id],
            Self::row_to_job,
        )?;
        tx.commit()?;
        Ok(Some(job))
    }

    pub fn complete(&self, job_id: i64, result_payload: Option<&str>) -> Result<Job> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE jobs SET status = 'completed', payload = COALESCE(?1, payload), finished_at = ?2 WHERE id = ?3",
            params![result_payload, now, job_id],
        )?;
        conn.query_row(
            "SELECT * FROM jobs WHERE id = ?1",
            params![job_id],
            Self::row_to_job,
        )
        .map_err(Into::into)
    }

    pub fn fail(&self, job_id: i64, error: &str) -> Result<Job> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "UPDATE jobs SET status = 'failed', error = ?1, finished_at = ?2 WHERE id = ?3",
            params![error, now, job_id],
        )?;
        conn.query_row(
            "SELECT * FROM jobs WHERE id = ?1",
            params![job_id],
            Self::row_to_job,
        )
        .map_err(Into::into)
    }

    pub fn jobs_for_record(&self, record_id: i64) -> Result<Vec<Job>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM jobs WHERE record_id = ?1")?;
        let rows = stmt
            .query_map(params![record_id], Self::row_to_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn jobs_for_record_by_kind(&self, record_id: i64, kind: &str) -> Result<Vec<Job>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM jobs WHERE record_id = ?1 AND kind = ?2")?;
        let rows = stmt
            .query_map(params![record_id, kind], Self::row_to_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// True if every translate_page/translate_record job for the record is
    /// `completed` (an empty set counts as true).
    pub fn translation_jobs_all_completed(&self, record_id: i64) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let outstanding: i64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE record_id = ?1 AND kind IN ('translate_page', 'translate_record') AND status != 'completed'",
            params![record_id],
            |row| row.get(0),
        )?;
        Ok(outstanding == 0)
    }

    pub fn has_job_of_kind(&self, record_id: i64, kind: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE record_id = ?1 AND kind = ?2",
            params![record_id, kind],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // -- audit-engine queries --------------------------------------------

    /// Jobs claimed longer than `stale_after_secs` ago — assumed abandoned
    /// by a dead worker.
    pub fn stale_claimed(&self, stale_after_secs: i64) -> Result<Vec<Job>> {
        let conn = self.conn.lock().unwrap();
        let cutoff = (Utc::now() - chrono::Duration::seconds(stale_after_secs)).to_rfc3339();
        let mut stmt = conn.prepare(
            "SELECT * FROM jobs WHERE status = 'claimed' AND started_at < ?1",
        )?;
        let rows = stmt
            .query_map(params![cutoff], Self::row_to_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn reclaim_stale(&self, job_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE jobs SET status = 'pending', started_at = NULL WHERE id = ?1 AND status = 'claimed'",
            params![job_id],
        )?;
        Ok(())
    }

    /// Failed jobs with attempts under the retry ceiling.
    pub fn retryable_failed(&self, max_attempts: i64) -> Result<Vec<Job>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM jobs WHERE status = 'failed' AND attempts < ?1",
        )?;
        let rows = stmt
            .query_map(params![max_attempts], Self::row_to_job)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn reset_failed_to_pending(&self, job_id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE jobs SET status = 'pending', error = NULL, finished_at = NULL WHERE id = ?1 AND status = 'failed'",
            params![job_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn claim_returns_none_when_empty() {
        let repo = JobRepository::in_memory().unwrap();
        assert!(repo.claim("ocr_page_paddle").unwrap().is_none());
    }

    #[test]
    fn claim_increments_attempts_and_sets_started_at() {
        let repo = JobRepository::in_memory().unwrap();
        repo.enqueue("ocr_page_paddle", Some(1), Some(1), None)
            .unwrap();
        let job = repo.claim("ocr_page_paddle").unwrap().unwrap();
        assert_eq!(job.attempts, 1);
        assert!(job.started_at.is_some());
        assert_eq!(job.status, JobStatus::Claimed);
    }

    #[test]
    fn claim_respects_fifo_order() {
        let repo = JobRepository::in_memory().unwrap();
        let first = repo.enqueue("k", None, None, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        repo.enqueue("k", None, None, None).unwrap();
        let claimed = repo.claim("k").unwrap().unwrap();
        assert_eq!(claimed.id, first.id);
    }

    #[test]
    fn concurrent_claims_never_return_the_same_job() {
        let repo = Arc::new(JobRepository::in_memory().unwrap());
        repo.enqueue("k", None, None, None).unwrap();

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let repo = Arc::clone(&repo);
                thread::spawn(move || repo.claim("k").unwrap())
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_some()).count();
        assert_eq!(successes, 1);
    }

    #[test]
    fn stale_claimed_jobs_are_found_after_window() {
        let repo = JobRepository::in_memory().unwrap();
        let job = repo.enqueue("k", None, None, None).unwrap();
        repo.claim("k").unwrap();
        {
            let conn = repo.conn.lock().unwrap();
            let ancient = (Utc::now() - chrono::Duration::hours(2)).to_rfc3339();
            conn.execute(
                "UPDATE jobs SET started_at = ?1 WHERE id = ?2",
                params![ancient, job.id],
            )
            .unwrap();
        }
        let stale = repo.stale_claimed(3600).unwrap();
        assert_eq!(stale.len(), 1);
        repo.reclaim_stale(job.id).unwrap();
        assert_eq!(repo.get(job.id).unwrap().unwrap().status, JobStatus::Pending);
    }

    #[test]
    fn translation_jobs_all_completed_is_true_for_empty_set() {
        let repo = JobRepository::in_memory().unwrap();
        assert!(repo.translation_jobs_all_completed(42).unwrap());
    }
}
