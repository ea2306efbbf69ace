//! # Cache Backends
//!
//! Raw storage of serialized cache entries, keyed by the caller supplied key.
//!
//! [`FileBackend`] keeps one JSON document per key under a root directory, so entries are
//! shared between processes. Each write goes to a temporary file in the same directory and
//! is then renamed over the target: a reader sees either the old entry or the new one,
//! never a partial write.
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const FILE_PREFIX: &str = "cache_";
const FILE_SUFFIX: &str = ".json";

/// Byte-level storage used by [`super::CacheStore`].
///
/// `load` returns `Ok(None)` for an absent key. Every other failure is an I/O error, which
/// the store turns into a miss.
pub trait CacheBackend: Send + Sync {
    fn load(&self, key: &str) -> io::Result<Option<Vec<u8>>>;
    fn store(&self, key: &str, bytes: &[u8]) -> io::Result<()>;
    fn remove(&self, key: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// File-per-key backend rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Uses `root` as the cache directory. It is created on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The platform cache directory of the application, if the platform defines one.
    pub fn default_root() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "odoo-rpc", "odoo-rpc")
            .map(|dirs| dirs.cache_dir().to_path_buf())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the entry for `key`: `cache_<sha256(key) hex>.json`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.root
            .join(format!("{FILE_PREFIX}{}{FILE_SUFFIX}", hex::encode(digest)))
    }
}

impl CacheBackend for FileBackend {
    fn load(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;

        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Removes every cache file under the root. Other files are left alone.
    fn clear(&self) -> io::Result<()> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let path = entry?.path();
            let is_cache_file = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(FILE_SUFFIX));

            if is_cache_file {
                fs::remove_file(&path)?;
            }
        }

        Ok(())
    }
}

/// Process-local backend, mostly useful in tests.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| io::Error::other("memory cache lock poisoned"))
    }
}

impl CacheBackend for MemoryBackend {
    fn load(&self, key: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn store(&self, key: &str, bytes: &[u8]) -> io::Result<()> {
        self.entries()?.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.entries()?.clear();
        Ok(())
    }
}
