use crate::io::{ImageStore, PAGE_IMAGES_DIR, verify_file_in_root};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;

/// Keeps images on the local disk under `{root_path}/page_images/`.
pub struct LocalImageStore {
    pub root_path: PathBuf,
}

impl LocalImageStore {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root_path.join(PAGE_IMAGES_DIR)
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store(&self, filename: &str, data: &[u8]) -> Result<()> {
        let dir = self.images_dir();
        let verified = verify_file_in_root(&dir, filename)?;

        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        tokio::fs::write(&verified, data)
            .await
            .with_context(|| format!("Failed to write {}", verified.display()))?;

        Ok(())
    }
}
