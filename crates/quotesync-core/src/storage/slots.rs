//! Durable key/value slots
//!
//! Each slot is one file under the slot directory, named after its key.
//! Writes are atomic (write to temp file, fsync, then rename), so a reader
//! never observes a partially written value.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};

/// Slot holding the JSON array of quotes
pub const RECORDS_KEY: &str = "records";

/// Slot holding the selected category filter
pub const FILTER_KEY: &str = "selectedFilter";

/// Filesystem-backed key/value slots
#[derive(Debug, Clone)]
pub struct SlotStore {
    dir: PathBuf,
}

impl SlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path(key).exists()
    }

    /// Read a slot as UTF-8 text
    ///
    /// Returns `None` if the slot has never been written.
    pub fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(StorageError::InvalidFormat {
                key: key.to_string(),
                details: "slot is not valid UTF-8".to_string(),
            }),
            Err(e) => Err(StorageError::ReadError { path, source: e }),
        }
    }

    /// Replace the value of a slot atomically
    pub fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path(key);
        atomic_write(&path, value.as_bytes())?;
        debug!("Wrote slot {} ({} bytes)", key, value.len());
        Ok(())
    }

    /// Copy a slot aside before it gets overwritten
    ///
    /// Returns the backup path.
    pub fn backup(&self, key: &str) -> StorageResult<PathBuf> {
        let path = self.path(key);
        let backup_path = self.path(&format!("{}.corrupt.backup", key));
        fs::copy(&path, &backup_path).map_err(|e| StorageError::from_io(e, backup_path.clone()))?;
        warn!("Backed up unreadable slot {:?} to {:?}", path, backup_path);
        Ok(backup_path)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    // Same directory, so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|e| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
