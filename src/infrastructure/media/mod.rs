//! Media Storage
//!
//! Binary payload storage for media messages. The relay decodes inbound
//! base64 payloads and hands the bytes here; the returned address is what
//! gets persisted and fanned out instead of the raw payload.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use crate::config::MediaSettings;
use crate::shared::error::AppError;

/// Storage contract for media payloads.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `bytes` under `file_name` and return the public address.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, AppError>;
}

/// Filesystem-backed media store.
pub struct LocalMediaStore {
    root: PathBuf,
    base_path: String,
}

impl LocalMediaStore {
    pub fn new(settings: &MediaSettings) -> Self {
        Self {
            root: PathBuf::from(&settings.root_dir),
            base_path: settings.base_path.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Stored media file");
        Ok(format!("{}/{}", self.base_path, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_file_and_returns_address() {
        let dir = std::env::temp_dir().join(format!("media-test-{}", uuid::Uuid::new_v4()));
        let store = LocalMediaStore::new(&MediaSettings {
            root_dir: dir.to_string_lossy().into_owned(),
            base_path: "/media/".to_string(),
        });

        let address = store.store("photo.png", b"payload").await.unwrap();

        assert_eq!(address, "/media/photo.png");
        let written = tokio::fs::read(dir.join("photo.png")).await.unwrap();
        assert_eq!(written, b"payload");

        let _ = tokio::fs::remove_dir_all(dir).await;
    }
}
