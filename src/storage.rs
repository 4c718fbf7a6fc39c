//! Content-addressed blob storage with the deterministic path layout
//! described in the external interfaces: every attachment lives under
//! `records/{id}/...` inside the configured blob root.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};
use crate::models::page::page_image_path;

#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn original_pdf_path(record_id: i64) -> String {
        format!("records/{record_id}/attachments/record.pdf")
    }

    pub fn searchable_pdf_path(record_id: i64) -> String {
        format!("records/{record_id}/derivatives/pdf/searchable.pdf")
    }

    pub fn ocr_artifact_path(record_id: i64, filename: &str) -> String {
        format!("records/{record_id}/derivatives/ocr/{filename}")
    }

    pub fn page_image_path(record_id: i64, seq: i32) -> String {
        page_image_path(record_id, seq)
    }

    /// Write bytes at a deterministic relative path, creating parent
    /// directories as needed, and return the SHA-256 hex digest.
    pub async fn write(&self, relative: &str, bytes: &[u8]) -> AppResult<String> {
        let path = self.absolute(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(sha256_hex(bytes))
    }

    pub async fn read(&self, relative: &str) -> AppResult<Vec<u8>> {
        let path = self.absolute(relative);
        tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::NotFound(format!("blob {relative} unreadable: {e}")))
    }

    /// Remove everything stored under `records/{record_id}/`.
    pub async fn delete_record_tree(&self, record_id: i64) -> AppResult<()> {
        let dir = self.absolute(&format!("records/{record_id}"));
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        let path = BlobStore::page_image_path(7, 1);
        let digest = store.write(&path, b"hello").await.unwrap();
        assert_eq!(digest, sha256_hex(b"hello"));
        let bytes = store.read(&path).await.unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[tokio::test]
    async fn delete_record_tree_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path());
        store
            .write(&BlobStore::page_image_path(3, 1), b"x")
            .await
            .unwrap();
        store.delete_record_tree(3).await.unwrap();
        store.delete_record_tree(3).await.unwrap();
        assert!(store.read(&BlobStore::page_image_path(3, 1)).await.is_err());
    }

    #[test]
    fn deterministic_paths_match_layout() {
        assert_eq!(
            BlobStore::original_pdf_path(9),
            "records/9/attachments/record.pdf"
        );
        assert_eq!(
            BlobStore::searchable_pdf_path(9),
            "records/9/derivatives/pdf/searchable.pdf"
        );
        assert_eq!(
            BlobStore::ocr_artifact_path(9, "p0001.hocr"),
            "records/9/derivatives/ocr/p0001.hocr"
        );
    }
}
