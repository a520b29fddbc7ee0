//! On-disk cache of raw registry documents.
//!
//! Each source key owns one slot: `<key>.csv` holds the raw bytes and
//! `<key>.meta.json` records where and when they were fetched.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata stored next to a cached document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    /// `Last-Modified` header of the response, used to revalidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// A cached document with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub bytes: Vec<u8>,
    pub meta: CacheMeta,
}

impl CacheEntry {
    /// Whether the entry is older than `ttl` at `now`.
    ///
    /// Entries stamped in the future (clock skew) count as fresh.
    #[must_use]
    pub fn is_stale(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(ttl) else {
            return false;
        };
        now.signed_duration_since(self.meta.fetched_at) > ttl
    }
}

/// Cache store rooted at a directory.
///
/// The store is an explicit object handed to the fetcher; nothing about it
/// is process-global, so registries processed in parallel each use their
/// own slots.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.csv"))
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.meta.json"))
    }

    /// Read a slot.
    ///
    /// Returns `Ok(None)` when the data file is absent. A data file without
    /// readable metadata is treated as fetched at the Unix epoch, so it is
    /// stale but still usable as a fallback.
    pub fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        let data_path = self.data_path(key);
        let bytes = match fs::read(&data_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let meta = match fs::read_to_string(self.meta_path(key)) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(meta) => meta,
                Err(e) => {
                    tracing::warn!(key, error = %e, "Unreadable cache metadata, treating entry as stale");
                    Self::unknown_meta()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::unknown_meta(),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(CacheEntry { bytes, meta }))
    }

    fn unknown_meta() -> CacheMeta {
        CacheMeta {
            url: String::new(),
            fetched_at: DateTime::<Utc>::UNIX_EPOCH,
            last_modified: None,
        }
    }

    /// Store a document and its metadata.
    pub fn store(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        write_atomic(&self.data_path(key), &entry.bytes)?;
        self.store_meta(key, &entry.meta)
    }

    /// Rewrite only the metadata of a slot (after a `304 Not Modified`).
    pub fn store_meta(&self, key: &str, meta: &CacheMeta) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let json = serde_json::to_string_pretty(meta)?;
        write_atomic(&self.meta_path(key), json.as_bytes())
    }
}

/// Write `bytes` to `path` through a temp file and rename.
///
/// The temp file is removed if any step fails, so a crash or error never
/// leaves a half-written target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{file_name}.tmp"));

    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        // On Windows, rename fails if the destination already exists
        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(path)?;
        }

        fs::rename(&temp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
