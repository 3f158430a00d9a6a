//! On-disk fetch cache shared across jobs.
//!
//! Entries are keyed by a SHA-256 digest of the query parameters, so the
//! same point/radius/layer query hits the same entry between runs. Writes
//! are atomic per entry (temp file plus rename) because concurrent jobs
//! may share one cache directory.

use std::fs;
use std::io;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Cache key uniquely identifying one upstream query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Endpoint the query targets.
    pub endpoint: String,
    /// Full query text; includes point, radius and layer filters.
    pub query: String,
}

impl CacheKey {
    pub fn new(endpoint: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            query: query.into(),
        }
    }

    /// Stable hex digest used as the entry filename.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.endpoint.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.query.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Cache abstraction so jobs can opt out of caching per run.
pub trait FetchCache: Send + Sync {
    /// Returns the cached response for a key, if any.
    fn get(&self, key: &CacheKey) -> Option<Vec<u8>>;

    /// Stores a response. Failures are recoverable; callers log and move on.
    fn put(&self, key: &CacheKey, data: &[u8]) -> Result<(), CacheError>;
}

/// Disk cache storing one file per query response.
pub struct DiskCache {
    cache_dir: PathBuf,
}

impl DiskCache {
    /// Creates the cache, creating the directory if needed.
    pub fn new(cache_dir: PathBuf) -> Result<Self, CacheError> {
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key.digest()))
    }
}

impl FetchCache for DiskCache {
    fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        match fs::read(self.entry_path(key)) {
            Ok(data) => {
                debug!(digest = %key.digest(), bytes = data.len(), "cache hit");
                Some(data)
            }
            Err(_) => None,
        }
    }

    fn put(&self, key: &CacheKey, data: &[u8]) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        // Write-then-rename keeps partially written entries invisible to
        // concurrent readers. The temp name carries the pid so concurrent
        // jobs never write the same temp file.
        let tmp = self
            .cache_dir
            .join(format!(".{}.{}.tmp", key.digest(), std::process::id()));
        fs::write(&tmp, data)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            warn!(error = %e, "failed to commit cache entry");
            return Err(e.into());
        }
        Ok(())
    }
}

/// No-op cache implementation that never caches.
///
/// Selected when a job runs with `use_cache` disabled.
#[derive(Debug, Clone, Default)]
pub struct NoOpCache;

impl FetchCache for NoOpCache {
    fn get(&self, _key: &CacheKey) -> Option<Vec<u8>> {
        None // Always miss
    }

    fn put(&self, _key: &CacheKey, _data: &[u8]) -> Result<(), CacheError> {
        Ok(()) // Accept but don't store
    }
}
