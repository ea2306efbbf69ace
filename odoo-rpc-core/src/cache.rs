//! # Cache Layer
//!
//! A TTL keyed store for the results of expensive idempotent queries.
//!
//! [`CacheStore`] is an explicit value: the caller builds one and hands it to the client
//! through [`crate::client::ClientOptions`]. Nothing is cached unless a store is supplied.
//!
//! The cache is purely an optimization. Every failure to read or write an entry is logged
//! and degrades to a miss, it never fails the operation that consulted the cache.
//!
//! Entries are JSON documents:
//!
//! ```json
//! {"stored_at": 1718000000, "ttl_seconds": 86400, "payload": ["res.partner"]}
//! ```
//!
//! An entry is valid while `now - stored_at < ttl_seconds`. Expired entries are treated as
//! misses and left in place until overwritten.
pub mod backend;
pub mod clock;

pub use backend::{CacheBackend, FileBackend, MemoryBackend};
pub use clock::{Clock, ManualClock, SystemClock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifetime of the cached model listing.
pub const DEFAULT_MODELS_TTL: u64 = 86_400;

/// A cached payload together with its freshness metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub stored_at: u64,
    pub ttl_seconds: u64,
    pub payload: Value,
}

impl CacheEntry {
    pub fn is_valid(&self, now: u64) -> bool {
        now.saturating_sub(self.stored_at) < self.ttl_seconds
    }
}

/// Key under which the model listing of one database is cached.
pub fn models_cache_key(url: &str, database: &str) -> String {
    let digest = Sha256::digest(format!("{url}:{database}").as_bytes());
    format!("models_{}", hex::encode(digest))
}

/// Handle on a cache backend. Clones share the same backend and clock.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(backend: impl CacheBackend + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
            clock: Arc::new(clock),
        }
    }

    /// File backed store under `root`, using the wall clock.
    pub fn on_disk(root: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(root), SystemClock)
    }

    /// File backed store in the platform cache directory, if the platform has one.
    pub fn default_on_disk() -> Option<Self> {
        FileBackend::default_root().map(Self::on_disk)
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new(), SystemClock)
    }

    /// Returns the payload stored under `key`, if present and not expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        let bytes = match self.backend.load(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key, "Cache miss");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Ignoring corrupt cache entry");
                return None;
            }
        };

        if !entry.is_valid(self.clock.now_secs()) {
            debug!(key, stored_at = entry.stored_at, "Cache entry expired");
            return None;
        }

        debug!(key, "Cache hit");
        Some(entry.payload)
    }

    /// Stores `payload` under `key` for `ttl_seconds`, replacing any previous entry.
    pub fn put(&self, key: &str, payload: Value, ttl_seconds: u64) {
        let entry = CacheEntry {
            stored_at: self.clock.now_secs(),
            ttl_seconds,
            payload,
        };

        let result = serde_json::to_vec(&entry)
            .map_err(std::io::Error::other)
            .and_then(|bytes| self.backend.store(key, &bytes));

        match result {
            Ok(()) => debug!(key, ttl_seconds, "Cache entry stored"),
            Err(e) => warn!(key, error = %e, "Failed to write cache entry"),
        }
    }

    pub fn invalidate(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            warn!(key, error = %e, "Failed to remove cache entry");
        }
    }

    /// Removes every entry of the backend.
    pub fn clear(&self) {
        if let Err(e) = self.backend.clear() {
            warn!(error = %e, "Failed to clear cache");
        }
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}
