//! Where fetched artwork lives.
//!
//! On disk the layout is `<root>/<system folder>/media/<game>/<file name>`,
//! one file per [`ArtworkCategory`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::time::Duration;

use crate::error::ScrapeError;
use crate::media::ArtworkCategory;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Sibling of `dest` that no other in-flight write uses.
fn temp_path(dest: &Path) -> PathBuf {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    dest.with_extension(format!("png.{}-{}.part", std::process::id(), seq))
}

/// Write `bytes` beside `dest`, then rename over it.
async fn write_replacing(dest: &Path, bytes: &[u8]) -> Result<(), ScrapeError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = temp_path(dest);
    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    tokio::fs::rename(&tmp, dest).await?;
    Ok(())
}

/// Artwork persistence used by the fetcher.
///
/// `save` downloads and stores in one step and reports plain success; a
/// failed save is an expected per-category outcome, not an error.
#[async_trait]
pub trait ArtworkStore: Send + Sync {
    async fn exists(&self, system_folder: &str, game: &str, category: ArtworkCategory) -> bool;

    async fn save(
        &self,
        url: &str,
        system_folder: &str,
        game: &str,
        category: ArtworkCategory,
    ) -> bool;
}

/// Filesystem store under a library root. Downloads come from the media CDN
/// and do not pass through the API rate limiter.
pub struct FsArtworkStore {
    root: PathBuf,
    http: reqwest::Client,
}

impl FsArtworkStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .connect_timeout(DOWNLOAD_TIMEOUT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self {
            root: root.into(),
            http,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn artwork_path(&self, system_folder: &str, game: &str, category: ArtworkCategory) -> PathBuf {
        self.root
            .join(system_folder)
            .join("media")
            .join(game)
            .join(category.file_name())
    }

    async fn download_to(&self, url: &str, dest: &Path) -> Result<(), ScrapeError> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Err(ScrapeError::Api(format!("Empty response from {url}")));
        }
        write_replacing(dest, &bytes).await
    }
}

#[async_trait]
impl ArtworkStore for FsArtworkStore {
    async fn exists(&self, system_folder: &str, game: &str, category: ArtworkCategory) -> bool {
        let path = self.artwork_path(system_folder, game, category);
        tokio::fs::try_exists(&path).await.unwrap_or(false)
    }

    async fn save(
        &self,
        url: &str,
        system_folder: &str,
        game: &str,
        category: ArtworkCategory,
    ) -> bool {
        let dest = self.artwork_path(system_folder, game, category);
        match self.download_to(url, &dest).await {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Failed to save {} for {}: {}", category, game, e);
                false
            }
        }
    }
}
