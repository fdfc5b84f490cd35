//! Key-value storage backends.
//!
//! Both implement [`StoragePort`].
//!
//! - [`FileStorage`]: one file per key under `<root>/<namespace>/`.
//!   Writes go to a temp file that is synced and renamed over the
//!   target, so a crash leaves either the old or the new record.
//! - [`MemoryStorage`]: simulation backend for tests and dry runs, with
//!   write-failure injection.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::app::ports::{StorageError, StoragePort};

// ───────────────────────────────────────────────────────────────
// File-backed
// ───────────────────────────────────────────────────────────────

pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        info!("FileStorage: {}", root.display());
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, namespace: &str, key: &str) -> PathBuf {
        self.root.join(namespace).join(key)
    }
}

fn io_error(e: &std::io::Error) -> StorageError {
    match e.kind() {
        ErrorKind::NotFound => StorageError::NotFound,
        ErrorKind::StorageFull => StorageError::Full,
        _ => StorageError::IoError(e.to_string()),
    }
}

impl StoragePort for FileStorage {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        fs::read(self.path(namespace, key)).map_err(|e| io_error(&e))
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let dir = self.root.join(namespace);
        fs::create_dir_all(&dir).map_err(|e| StorageError::IoError(e.to_string()))?;

        let target = dir.join(key);
        let tmp = dir.join(format!(".{key}.tmp"));
        let result = (|| {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(data)?;
            file.sync_all()?;
            fs::rename(&tmp, &target)?;
            // Make the rename itself durable.
            fs::File::open(&dir)?.sync_all()
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(io_error(&e));
        }
        debug!("FileStorage: wrote {} bytes to {}", data.len(), target.display());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(namespace, key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&e)),
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.path(namespace, key).is_file()
    }
}

// ───────────────────────────────────────────────────────────────
// In-memory
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    store: HashMap<String, Vec<u8>>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Make every following write fail with an I/O error.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.store
            .get(&Self::composite_key(namespace, key))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError("simulated write failure".to_owned()));
        }
        self.store.insert(Self::composite_key(namespace, key), data.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&Self::composite_key(namespace, key))
    }
}
