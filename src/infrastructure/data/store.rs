// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::SniperError;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Generic key/value blob store. No transactional guarantees; callers treat
/// each key as an independent blob.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SniperError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SniperError>;
    fn remove(&self, key: &str) -> Result<(), SniperError>;
}

/// One file per key under a data directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Result<Self, SniperError> {
        fs::create_dir_all(&root).map_err(|e| {
            SniperError::Persistence(format!("Cannot create {}: {}", root.display(), e))
        })?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.root.join(format!("{safe}.json"))
    }
}

impl BlobStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, SniperError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| SniperError::Persistence(format!("Read {} failed: {}", path.display(), e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SniperError> {
        let path = self.path_for(key);
        // Write-then-rename so an abrupt exit never leaves a torn blob.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .map_err(|e| SniperError::Persistence(format!("Write {} failed: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path).map_err(|e| {
            SniperError::Persistence(format!("Rename {} failed: {}", path.display(), e))
        })
    }

    fn remove(&self, key: &str) -> Result<(), SniperError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                SniperError::Persistence(format!("Remove {} failed: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, SniperError> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SniperError> {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SniperError> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }
}
