//! Versioned file storage behind the rack store.
//!
//! A backend holds whole files addressed by path and hands out an opaque
//! version token for each revision. Writes are conditional on that token.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub mod file_store;
pub mod github;
pub mod memory;

pub use file_store::FileVersionedStore;
pub use github::{GithubConfig, GithubVersionedStore};
pub use memory::MemoryVersionedStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("version mismatch")]
    VersionMismatch,
    #[error("{0}")]
    Unavailable(String),
}

/// A file's bytes together with the version they were read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: Vec<u8>,
    pub version: String,
}

/// Trait abstraction for a remote, version-controlled file store.
/// Implementations can be the GitHub contents API, a local directory, or memory.
#[async_trait]
pub trait VersionedFileStore: Send + Sync {
    /// Read the current revision; `NotFound` if the file does not exist.
    async fn get(&self, path: &str) -> Result<RemoteFile, StorageError>;

    /// Create a new file; `VersionMismatch` if it already exists.
    async fn create(&self, path: &str, content: Vec<u8>, message: &str) -> Result<String, StorageError>;

    /// Replace the file if its current version equals `expected`.
    async fn update(&self, path: &str, content: Vec<u8>, expected: &str, message: &str) -> Result<String, StorageError>;
}

/// SHA-256 hex digest used as the version token by local backends.
pub fn content_version(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_version_is_sha256_hex() {
        assert_eq!(
            content_version(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(content_version(b"a"), content_version(b"b"));
    }
}
