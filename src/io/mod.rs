use anyhow::{Result, bail};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

pub mod local;

/// Directory (and URL segment) page images are kept under.
pub const PAGE_IMAGES_DIR: &str = "page_images";

// where uploaded page images end up; the host decides how they are served
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `data` as `page_images/{filename}`, replacing any existing file.
    async fn store(&self, filename: &str, data: &[u8]) -> Result<()>;
}

// joins a single file name onto root, refusing anything that could escape it
pub fn verify_file_in_root(root: &Path, filename: &str) -> Result<PathBuf> {
    let candidate = Path::new(filename);
    let mut components = candidate.components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(root.join(candidate)),
        _ => bail!("Refusing to store {} outside of {}", filename, root.display()),
    }
}
