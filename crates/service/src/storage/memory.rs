use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{content_version, RemoteFile, StorageError, VersionedFileStore};

/// Process-local versioned store for tests and the `memory` backend setting.
#[derive(Default)]
pub struct MemoryVersionedStore {
    files: Mutex<HashMap<String, Vec<u8>>>, // key: path
    offline: AtomicBool,
}

impl MemoryVersionedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a file unconditionally, as another session or a manual commit would.
    pub fn put_external(&self, path: &str, content: impl Into<Vec<u8>>) -> Result<String, StorageError> {
        let content = content.into();
        let version = content_version(&content);
        self.files()?.insert(path.to_string(), content);
        Ok(version)
    }

    /// Current bytes of a file, bypassing the outage switch.
    pub fn snapshot(&self, path: &str) -> Option<Vec<u8>> {
        self.files().ok()?.get(path).cloned()
    }

    /// Simulate the remote being unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn files(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, StorageError> {
        self.files.lock().map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))
    }

    fn online(&self) -> Result<(), StorageError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl VersionedFileStore for MemoryVersionedStore {
    async fn get(&self, path: &str) -> Result<RemoteFile, StorageError> {
        self.online()?;
        let files = self.files()?;
        let content = files.get(path).cloned().ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        let version = content_version(&content);
        Ok(RemoteFile { content, version })
    }

    async fn create(&self, path: &str, content: Vec<u8>, _message: &str) -> Result<String, StorageError> {
        self.online()?;
        let mut files = self.files()?;
        if files.contains_key(path) {
            return Err(StorageError::VersionMismatch);
        }
        let version = content_version(&content);
        files.insert(path.to_string(), content);
        Ok(version)
    }

    async fn update(&self, path: &str, content: Vec<u8>, expected: &str, _message: &str) -> Result<String, StorageError> {
        self.online()?;
        let mut files = self.files()?;
        let current = files.get(path).ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        if content_version(current) != expected {
            return Err(StorageError::VersionMismatch);
        }
        let version = content_version(&content);
        files.insert(path.to_string(), content);
        Ok(version)
    }
}
