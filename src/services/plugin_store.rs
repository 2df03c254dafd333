//! Durable storage for uploaded plugin artifacts
//!
//! Artifacts are written to a temporary file in the plugin directory, synced,
//! and then renamed into place, so a crash never leaves a truncated file under
//! the final name. Loading the artifact into an engine is not done here.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[allow(clippy::unwrap_used)]
static FILE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,254}$").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum PluginStoreError {
    #[error("Invalid plugin file name: {0:?}")]
    InvalidFileName(String),

    #[error("Plugin payload is empty")]
    EmptyPayload,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receipt for a stored artifact
#[derive(Debug, Clone, Serialize)]
pub struct StoredArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct PluginStore {
    dir: PathBuf,
}

impl PluginStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reduces a client-supplied name to a bare, safe file name
    ///
    /// Any directory components are discarded before validation.
    pub fn sanitize_file_name(raw: &str) -> Result<String, PluginStoreError> {
        let base = raw
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();

        if FILE_NAME_PATTERN.is_match(base) && base != "." && base != ".." {
            Ok(base.to_string())
        } else {
            Err(PluginStoreError::InvalidFileName(raw.to_string()))
        }
    }

    /// Writes the artifact and returns its receipt
    ///
    /// An existing artifact with the same name is replaced.
    pub async fn store(
        &self,
        raw_file_name: &str,
        payload: &[u8],
    ) -> Result<StoredArtifact, PluginStoreError> {
        let file_name = Self::sanitize_file_name(raw_file_name)?;
        if payload.is_empty() {
            return Err(PluginStoreError::EmptyPayload);
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let final_path = self.dir.join(&file_name);
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.part", file_name, uuid::Uuid::new_v4()));

        let write_result: std::io::Result<()> = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(payload).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp_path, &final_path).await
        }
        .await;

        if let Err(e) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        let sha256 = hex::encode(Sha256::digest(payload));
        tracing::info!(
            file = %file_name,
            size = payload.len(),
            sha256 = %sha256,
            "Stored plugin artifact"
        );

        Ok(StoredArtifact {
            file_name,
            path: final_path,
            size: payload.len() as u64,
            sha256,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(
            PluginStore::sanitize_file_name("../../etc/plugin.so").unwrap(),
            "plugin.so"
        );
        assert_eq!(
            PluginStore::sanitize_file_name("C:\\tmp\\tool.wasm").unwrap(),
            "tool.wasm"
        );
    }

    #[test]
    fn test_sanitize_rejects_bad_names() {
        for name in ["", "..", "dir/", ".hidden", "with space.so", "semi;colon"] {
            assert!(
                PluginStore::sanitize_file_name(name).is_err(),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[tokio::test]
    async fn test_store_writes_file_and_digest() {
        let dir = TempDir::new().unwrap();
        let store = PluginStore::new(dir.path().join("plugins"));

        let artifact = store.store("hello.so", b"hello").await.unwrap();

        assert_eq!(artifact.file_name, "hello.so");
        assert_eq!(artifact.size, 5);
        assert_eq!(
            artifact.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        let written = tokio::fs::read(&artifact.path).await.unwrap();
        assert_eq!(written, b"hello");
    }

    #[tokio::test]
    async fn test_store_replaces_existing_and_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = PluginStore::new(dir.path());

        store.store("p.so", b"one").await.unwrap();
        let artifact = store.store("p.so", b"two").await.unwrap();

        assert_eq!(tokio::fs::read(&artifact.path).await.unwrap(), b"two");

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["p.so"]);
    }

    #[tokio::test]
    async fn test_store_rejects_empty_payload() {
        let dir = TempDir::new().unwrap();
        let store = PluginStore::new(dir.path());
        assert!(matches!(
            store.store("p.so", b"").await,
            Err(PluginStoreError::EmptyPayload)
        ));
    }
}
