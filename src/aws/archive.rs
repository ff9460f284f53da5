//! Local code archive reader.

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, DeployError, Result};

use super::api::ArchiveReader;

/// Reads archives from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsArchiveReader;

impl FsArchiveReader {
    /// Creates a new reader.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArchiveReader for FsArchiveReader {
    async fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            DeployError::Config(ConfigError::ArchiveUnreadable {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        })?;

        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_bytes_unchanged() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("code.zip");
        let payload = vec![0x50, 0x4b, 0x03, 0x04, 0x00, 0xff];
        std::fs::write(&path, &payload).expect("write archive");

        let bytes = FsArchiveReader::new()
            .read_all(&path)
            .await
            .expect("archive readable");
        assert_eq!(bytes, payload);
    }

    #[tokio::test]
    async fn test_missing_archive() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let result = FsArchiveReader::new()
            .read_all(&dir.path().join("missing.zip"))
            .await;

        assert!(matches!(
            result,
            Err(DeployError::Config(ConfigError::ArchiveUnreadable { .. }))
        ));
    }
}
