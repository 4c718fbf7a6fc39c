//! Configuration for the archivist orchestration core, loaded the way the
//! reference stack does it: compiled defaults, then an optional TOML file
//! discovered by `prefer`, then environment variable overrides, with a
//! `.env` file read before any of it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_DATABASE_FILENAME: &str = "archivist.db";

/// Application settings resolved from defaults, config file, and environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory (holds the database and, unless overridden, the blob store).
    pub data_dir: PathBuf,
    /// Database filename, resolved under `data_dir` unless `database_url` is set.
    pub database_filename: String,
    /// Explicit database URL/path, overrides `data_dir`/`database_filename` if set.
    pub database_url: Option<String>,
    /// Root of the content-addressed blob store.
    pub blob_root: PathBuf,
    /// Shared bearer token required on every processor endpoint.
    pub bearer_token: String,
    /// Worker presence liveness window, in seconds.
    pub worker_presence_ttl_secs: u64,
    /// Scraper presence liveness window, in seconds.
    pub scraper_presence_ttl_secs: u64,
    /// How long a claimed job may go unclaimed-back before the audit reclaims it.
    pub stale_claim_secs: i64,
    /// Failed jobs with fewer than this many attempts are retried by the audit.
    pub max_attempts: i64,
    /// How often the background audit loop runs, in seconds.
    pub audit_interval_secs: u64,
    /// How long a record may sit in `ingesting` with all pages present before
    /// the audit treats it as stuck and reconstructs the completion step.
    pub stuck_ingesting_secs: i64,
    /// SSE subscriptions are dropped after this many seconds of idleness.
    pub event_stream_idle_secs: u64,
    /// Maximum accepted size, in bytes, for a born-digital text PDF ingest.
    pub text_pdf_max_bytes: usize,
    /// Maximum accepted page count for a born-digital text PDF ingest.
    pub text_pdf_max_pages: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("archivist");

        Self {
            blob_root: data_dir.join("blobs"),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            bearer_token: "change-me".to_string(),
            worker_presence_ttl_secs: 60,
            scraper_presence_ttl_secs: 90,
            stale_claim_secs: 3600,
            max_attempts: 3,
            audit_interval_secs: 1800,
            stuck_ingesting_secs: 600,
            event_stream_idle_secs: 1800,
            text_pdf_max_bytes: 100 * 1024 * 1024,
            text_pdf_max_pages: 500,
        }
    }
}

impl Settings {
    /// Full path to the database file (for SQLite file-based databases).
    pub fn database_path(&self) -> PathBuf {
        if let Some(url) = &self.database_url {
            PathBuf::from(url.trim_start_matches("sqlite:"))
        } else {
            self.data_dir.join(&self.database_filename)
        }
    }

    /// Ensure the data directory and blob root exist, logging diagnostics on
    /// failure the way the reference stack does for container permission issues.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            Self::log_directory_diagnostics(&self.data_dir, "data_dir");
            Self::log_directory_diagnostics(&self.blob_root, "blob_root");
        }

        std::fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "failed to create data directory '{}': {e}",
                    self.data_dir.display()
                ),
            )
        })?;
        std::fs::create_dir_all(&self.blob_root).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "failed to create blob root '{}': {e}",
                    self.blob_root.display()
                ),
            )
        })?;
        Ok(())
    }

    #[cfg(unix)]
    fn log_directory_diagnostics(path: &Path, label: &str) {
        use std::os::unix::fs::MetadataExt;
        let uid = unsafe { libc::getuid() };
        let gid = unsafe { libc::getgid() };
        tracing::debug!(
            "{label} check: path={}, running as uid={uid} gid={gid}",
            path.display()
        );
        if let Ok(meta) = std::fs::metadata(path) {
            tracing::debug!(
                "{label} exists: owner={}:{}, mode={:o}",
                meta.uid(),
                meta.gid(),
                meta.mode() & 0o7777
            );
        }
    }
}

/// File-based configuration overlay. Every field is optional so a config
/// file only needs to mention the settings it wants to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub database_filename: Option<String>,
    pub database_url: Option<String>,
    pub blob_root: Option<PathBuf>,
    pub bearer_token: Option<String>,
    pub worker_presence_ttl_secs: Option<u64>,
    pub scraper_presence_ttl_secs: Option<u64>,
    pub stale_claim_secs: Option<i64>,
    pub max_attempts: Option<i64>,
    pub audit_interval_secs: Option<u64>,
    pub stuck_ingesting_secs: Option<i64>,
    pub event_stream_idle_secs: Option<u64>,
    pub text_pdf_max_bytes: Option<usize>,
    pub text_pdf_max_pages: Option<usize>,
}

impl FileConfig {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(v) = &self.data_dir {
            settings.data_dir = v.clone();
        }
        if let Some(v) = &self.database_filename {
            settings.database_filename = v.clone();
        }
        if let Some(v) = &self.database_url {
            settings.database_url = Some(v.clone());
        }
        if let Some(v) = &self.blob_root {
            settings.blob_root = v.clone();
        }
        if let Some(v) = &self.bearer_token {
            settings.bearer_token = v.clone();
        }
        if let Some(v) = self.worker_presence_ttl_secs {
            settings.worker_presence_ttl_secs = v;
        }
        if let Some(v) = self.scraper_presence_ttl_secs {
            settings.scraper_presence_ttl_secs = v;
        }
        if let Some(v) = self.stale_claim_secs {
            settings.stale_claim_secs = v;
        }
        if let Some(v) = self.max_attempts {
            settings.max_attempts = v;
        }
        if let Some(v) = self.audit_interval_secs {
            settings.audit_interval_secs = v;
        }
        if let Some(v) = self.stuck_ingesting_secs {
            settings.stuck_ingesting_secs = v;
        }
        if let Some(v) = self.event_stream_idle_secs {
            settings.event_stream_idle_secs = v;
        }
        if let Some(v) = self.text_pdf_max_bytes {
            settings.text_pdf_max_bytes = v;
        }
        if let Some(v) = self.text_pdf_max_pages {
            settings.text_pdf_max_pages = v;
        }
    }

    async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("failed to read config file: {e}"))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");
        match ext {
            "toml" => toml::from_str(&contents).map_err(|e| format!("invalid TOML config: {e}")),
            "json" => serde_json::from_str(&contents).map_err(|e| format!("invalid JSON config: {e}")),
            other => Err(format!("unsupported config file extension: {other}")),
        }
    }

    /// Discover a config file via the `prefer` crate's standard search path
    /// (XDG config dirs, `./archivist.toml`, etc.) and load it if found.
    async fn discover() -> Option<Self> {
        let discovered = prefer::load("archivist").await.ok()?;
        let path = discovered.source_path()?;
        match Self::load_from_path(path).await {
            Ok(cfg) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to parse discovered config file, ignoring it");
                None
            }
        }
    }
}

/// Options controlling where settings are loaded from.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path, overrides auto-discovery.
    pub config_path: Option<PathBuf>,
    /// Explicit data directory, overrides the config file's.
    pub data_dir: Option<PathBuf>,
}

/// Load settings: defaults, then an explicit or auto-discovered config
/// file, then environment variable overrides. `.env` should already have
/// been loaded by the caller (the binary entry point does this first thing).
pub async fn load_settings(options: LoadOptions) -> Settings {
    let mut settings = Settings::default();

    let file_config = if let Some(path) = &options.config_path {
        match FileConfig::load_from_path(path).await {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to load explicit config file");
                None
            }
        }
    } else {
        FileConfig::discover().await
    };

    if let Some(cfg) = file_config {
        cfg.apply_to(&mut settings);
    }

    if let Some(data_dir) = options.data_dir {
        settings.data_dir = data_dir;
    }

    apply_env_overrides(&mut settings);
    settings
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Some(v) = env_string("DATABASE_URL") {
        settings.database_url = Some(v);
    }
    if let Some(v) = env_string("BLOB_ROOT") {
        settings.blob_root = PathBuf::from(v);
    }
    if let Some(v) = env_string("PROCESSOR_BEARER_TOKEN") {
        settings.bearer_token = v;
    }
    if let Some(v) = env_parsed::<u64>("WORKER_PRESENCE_TTL_SECS") {
        settings.worker_presence_ttl_secs = v;
    }
    if let Some(v) = env_parsed::<u64>("SCRAPER_PRESENCE_TTL_SECS") {
        settings.scraper_presence_ttl_secs = v;
    }
    if let Some(v) = env_parsed::<i64>("STALE_CLAIM_SECS") {
        settings.stale_claim_secs = v;
    }
    if let Some(v) = env_parsed::<i64>("MAX_ATTEMPTS") {
        settings.max_attempts = v;
    }
    if let Some(v) = env_parsed::<u64>("AUDIT_INTERVAL_SECS") {
        settings.audit_interval_secs = v;
    }
    if let Some(v) = env_parsed::<u64>("EVENT_STREAM_IDLE_SECS") {
        settings.event_stream_idle_secs = v;
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.worker_presence_ttl_secs, 60);
        assert_eq!(settings.scraper_presence_ttl_secs, 90);
        assert_eq!(settings.stale_claim_secs, 3600);
        assert_eq!(settings.max_attempts, 3);
    }

    #[test]
    fn database_path_honors_explicit_url() {
        let mut settings = Settings::default();
        settings.database_url = Some("sqlite:/tmp/x.db".to_string());
        assert_eq!(settings.database_path(), PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn file_config_only_overrides_present_fields() {
        let mut settings = Settings::default();
        let original_bearer = settings.bearer_token.clone();
        let overlay = FileConfig {
            max_attempts: Some(7),
            ..Default::default()
        };
        overlay.apply_to(&mut settings);
        assert_eq!(settings.max_attempts, 7);
        assert_eq!(settings.bearer_token, original_bearer);
    }
}
