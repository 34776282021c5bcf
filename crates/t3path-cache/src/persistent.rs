//! Slower, durable cache layer.
//!
//! A [`PersistentLayer`] stores [`CacheEntry`] values by cache key. Layers
//! report their own failures through [`CacheError`]; the layered cache turns
//! those into logged misses so the [`t3path_core::PathCache`] contract stays
//! infallible.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, warn};

use crate::entry::CacheEntry;

/// Persistent-layer errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error while reading or writing cache files
    #[error("Cache I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stored entry could not be (de)serialized
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Durable key → entry store.
pub trait PersistentLayer: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    fn store(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Returns whether an entry was removed.
    fn remove(&self, key: &str) -> Result<bool, CacheError>;

    /// Every stored key, in no particular order.
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    fn clear(&self) -> Result<(), CacheError>;

    /// Number of stored entries.
    fn count(&self) -> Result<usize, CacheError> {
        Ok(self.keys()?.len())
    }
}

/// On-disk document: the key is kept alongside the entry so invalidation can
/// match on it without reversing the file name hash.
#[derive(Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    entry: CacheEntry,
}

/// One JSON file per entry, named by the SHA-256 of the cache key.
#[derive(Debug, Clone)]
pub struct JsonFileLayer {
    dir: PathBuf,
}

impl JsonFileLayer {
    /// Open (and create if needed) a cache directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CacheError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        let name = digest.iter().fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        });
        self.dir.join(format!("{name}.json"))
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>, CacheError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;
        Ok(entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect())
    }

    fn read(path: &Path) -> Result<Option<StoredEntry>, CacheError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io(path, e)),
        }
    }
}

impl PersistentLayer for JsonFileLayer {
    fn load(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let stored = Self::read(&self.file_for(key))?;
        // A hash collision would surface as a different key.
        Ok(stored.filter(|s| s.key == key).map(|s| s.entry))
    }

    fn store(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        let path = self.file_for(key);
        let document = StoredEntry {
            key: key.to_string(),
            entry: entry.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;

        // Write then rename so readers never see a partial document.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes).map_err(|e| CacheError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| CacheError::io(&path, e))?;
        debug!(file = %path.display(), "stored persistent cache entry");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let path = self.file_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::io(&path, e)),
        }
    }

    /// Documents that cannot be read or parsed are logged and skipped so one
    /// foreign file does not hide the rest of the store.
    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut keys = Vec::new();
        for path in self.entry_files()? {
            match Self::read(&path) {
                Ok(Some(stored)) => keys.push(stored.key),
                Ok(None) => {}
                Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable cache document"),
            }
        }
        Ok(keys)
    }

    /// Counts documents without parsing them.
    fn count(&self) -> Result<usize, CacheError> {
        Ok(self.entry_files()?.len())
    }

    fn clear(&self) -> Result<(), CacheError> {
        for path in self.entry_files()? {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::io(&path, e)),
            }
        }
        Ok(())
    }
}
