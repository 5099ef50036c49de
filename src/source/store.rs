//! Content-addressed store for uploaded CSV bytes.
//!
//! The engine reads CSV from disk, so uploads are written to a file once per
//! unique content and the same path is reused on every later query. Entries
//! are keyed by `(name, length, sha256)`: re-uploading different bytes under
//! the same name gets a fresh file.
//!
//! Files live in a directory owned by the store and are removed when the
//! store is dropped. Integrators wanting earlier cleanup call
//! [`UploadStore::evict`] or [`UploadStore::clear`].

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use sha2::{Digest, Sha256};
use tempfile::TempDir;

/// Identity of an upload's content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadKey {
    pub name: String,
    pub len: usize,
    /// Lowercase hex SHA-256 of the bytes.
    pub digest: String,
}

impl UploadKey {
    pub fn for_content(name: &str, bytes: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            len: bytes.len(),
            digest: format!("{:x}", Sha256::digest(bytes)),
        }
    }
}

/// Idempotent materialization of uploaded bytes.
pub struct UploadStore {
    dir: TempDir,
    entries: Mutex<HashMap<UploadKey, PathBuf>>,
}

impl UploadStore {
    /// Create a store backed by a fresh directory under the system temp dir.
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("csvpivot-").tempdir()?;
        Ok(Self::with_dir(dir))
    }

    /// Create a store backed by a fresh directory under `parent`.
    pub fn new_in<P: AsRef<Path>>(parent: P) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("csvpivot-")
            .tempdir_in(parent)?;
        Ok(Self::with_dir(dir))
    }

    fn with_dir(dir: TempDir) -> Self {
        Self {
            dir,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<UploadKey, PathBuf>> {
        // A panic mid-insert leaves the map consistent; keep using it.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Directory holding materialized files.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Return a stable path holding `bytes`, writing it on first sight.
    ///
    /// A cached file that has since disappeared from disk is written again.
    /// The write is blocking and holds the entry lock; async callers go
    /// through [`PivotSession::resolve_relation`](crate::session::PivotSession::resolve_relation),
    /// which runs it on the blocking pool.
    pub fn ensure_materialized(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let key = UploadKey::for_content(name, bytes);
        let mut entries = self.entries();

        if let Some(path) = entries.get(&key) {
            if path.exists() {
                return Ok(path.clone());
            }
            log::warn!("materialized upload {} vanished; rewriting", path.display());
        }

        let path = self.dir.path().join(format!("{}.csv", uuid::Uuid::new_v4()));
        fs::write(&path, bytes)?;
        log::info!(
            "materialized upload {:?} ({} bytes) at {}",
            name,
            bytes.len(),
            path.display()
        );

        entries.insert(key, path.clone());
        Ok(path)
    }

    /// Path previously materialized for `key`, if any.
    pub fn get(&self, key: &UploadKey) -> Option<PathBuf> {
        self.entries().get(key).cloned()
    }

    /// Forget `key` and delete its file. Returns whether an entry existed.
    pub fn evict(&self, key: &UploadKey) -> io::Result<bool> {
        let removed = self.entries().remove(key);
        match removed {
            Some(path) => {
                remove_if_present(&path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forget every entry and delete its file.
    pub fn clear(&self) -> io::Result<()> {
        let drained: Vec<PathBuf> = self.entries().drain().map(|(_, path)| path).collect();
        for path in drained {
            remove_if_present(&path)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
