use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};
use tracing::debug;

use super::{content_version, RemoteFile, StorageError, VersionedFileStore};

/// Directory-backed versioned store.
///
/// Version tokens are SHA-256 digests of the file bytes. Compare-and-write is
/// serialised by an in-process mutex, so it is only safe for a single server
/// process per directory.
pub struct FileVersionedStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileVersionedStore {
    /// Use `root` as the data directory, creating it if missing.
    pub async fn new<P: Into<PathBuf>>(root: P) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| unavailable(&root, e))?;
        Ok(Self { root, write_lock: Mutex::new(()) })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| !matches!(c, Component::Normal(_)));
        if path.is_empty() || escapes {
            return Err(StorageError::Unavailable(format!("invalid storage path {path:?}")));
        }
        Ok(self.root.join(relative))
    }

    async fn read(&self, full: &Path, path: &str) -> Result<Vec<u8>, StorageError> {
        match fs::read(full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound(path.to_string())),
            Err(e) => Err(unavailable(full, e)),
        }
    }

    /// Write through a sibling temp file and rename over the target.
    async fn write(&self, full: &Path, content: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await.map_err(|e| unavailable(parent, e))?;
        }
        let mut tmp = full.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, content).await.map_err(|e| unavailable(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, full).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(unavailable(full, e));
        }
        Ok(())
    }
}

fn unavailable(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Unavailable(format!("{}: {e}", path.display()))
}

#[async_trait]
impl VersionedFileStore for FileVersionedStore {
    async fn get(&self, path: &str) -> Result<RemoteFile, StorageError> {
        let full = self.resolve(path)?;
        let content = self.read(&full, path).await?;
        let version = content_version(&content);
        Ok(RemoteFile { content, version })
    }

    async fn create(&self, path: &str, content: Vec<u8>, message: &str) -> Result<String, StorageError> {
        let full = self.resolve(path)?;
        let _guard = self.write_lock.lock().await;
        match self.read(&full, path).await {
            Ok(_) => return Err(StorageError::VersionMismatch),
            Err(StorageError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }
        self.write(&full, &content).await?;
        debug!(path, commit_message = %message, "file store create");
        Ok(content_version(&content))
    }

    async fn update(&self, path: &str, content: Vec<u8>, expected: &str, message: &str) -> Result<String, StorageError> {
        let full = self.resolve(path)?;
        let _guard = self.write_lock.lock().await;
        let current = self.read(&full, path).await?;
        if content_version(&current) != expected {
            return Err(StorageError::VersionMismatch);
        }
        self.write(&full, &content).await?;
        debug!(path, commit_message = %message, "file store update");
        Ok(content_version(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_conditional_writes_persist() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("file_versioned_store_{}", uuid::Uuid::new_v4()));
        let store = FileVersionedStore::new(&dir).await?;

        assert!(matches!(store.get("rack.json").await, Err(StorageError::NotFound(_))));

        let v1 = store.create("rack.json", b"{}".to_vec(), "create").await?;
        assert_eq!(store.create("rack.json", b"{}".to_vec(), "create").await, Err(StorageError::VersionMismatch));

        let v2 = store.update("rack.json", br#"{"a": {}}"#.to_vec(), &v1, "update").await?;
        assert_ne!(v1, v2);
        assert_eq!(store.update("rack.json", b"{}".to_vec(), &v1, "update").await, Err(StorageError::VersionMismatch));

        // reopen from disk
        let reopened = FileVersionedStore::new(&dir).await?;
        let file = reopened.get("rack.json").await?;
        assert_eq!(file.content, br#"{"a": {}}"#);
        assert_eq!(file.version, v2);

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("file_versioned_store_{}", uuid::Uuid::new_v4()));
        let store = FileVersionedStore::new(&dir).await?;
        // a non-empty directory at the target makes the rename fail
        let target = dir.join("rack.json");
        tokio::fs::create_dir_all(target.join("occupied")).await?;

        let result = store.write(&target, b"{}").await;
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
        assert!(!dir.join("rack.json.tmp").exists());

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn file_store_rejects_escaping_paths() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("file_versioned_store_{}", uuid::Uuid::new_v4()));
        let store = FileVersionedStore::new(&dir).await?;
        for bad in ["", "../rack.json", "/etc/passwd", "a/../../b"] {
            assert!(matches!(store.get(bad).await, Err(StorageError::Unavailable(_))), "{bad:?}");
        }
        assert!(store.get("nested/rack.json").await.is_err());
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
