//! Durable record of ROMs the catalog has no match for.
//!
//! Keys are `"<system folder>/<file name>"`. A key present here means a
//! previous run exhausted both name and hash search, so the fetcher skips the
//! ROM without spending API calls.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ScrapeError;

/// Read/append access to the not-found set.
#[async_trait]
pub trait NotFoundMemo: Send + Sync {
    fn contains(&self, key: &str) -> bool;

    /// Record a key. Returns `true` if it was not already present.
    async fn insert(&self, key: &str) -> Result<bool, ScrapeError>;
}

/// Not-found set backed by a JSON array on disk.
///
/// The file is read once at open and rewritten atomically after every new
/// key. Without a path the memo lives only in memory.
#[derive(Debug)]
pub struct FileNotFoundMemo {
    path: Option<PathBuf>,
    keys: Mutex<BTreeSet<String>>,
    /// Serialises file rewrites so a newer snapshot is never overwritten by an older one
    write_lock: tokio::sync::Mutex<()>,
}

/// Default memo location: `~/.local/share/retro-art/not-found.json`.
pub fn default_memo_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("retro-art").join("not-found.json"))
}

impl FileNotFoundMemo {
    /// Open the memo at `path`. A missing file is an empty memo.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ScrapeError> {
        let path = path.into();
        let keys = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeSet::new()
            } else {
                serde_json::from_str::<Vec<String>>(&content)?
                    .into_iter()
                    .collect()
            }
        } else {
            BTreeSet::new()
        };
        log::debug!("Loaded {} not-found keys from {}", keys.len(), path.display());
        Ok(Self {
            path: Some(path),
            keys: Mutex::new(keys),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            keys: Mutex::new(BTreeSet::new()),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// All keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget every key, persisting the empty set. Returns how many were removed.
    pub fn clear(&self) -> Result<usize, ScrapeError> {
        let mut keys = self.lock();
        let removed = keys.len();
        keys.clear();
        self.persist(&keys)?;
        Ok(removed)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        // A poisoned set is still a valid set
        self.keys.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Blocking rewrite, for callers outside a runtime (e.g. `clear`).
    fn persist(&self, keys: &BTreeSet<String>) -> Result<(), ScrapeError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, to_json(keys)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn to_json(keys: &BTreeSet<String>) -> Result<String, ScrapeError> {
    Ok(serde_json::to_string_pretty(&keys.iter().collect::<Vec<_>>())?)
}

async fn write_json(path: &Path, json: String) -> Result<(), ScrapeError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl NotFoundMemo for FileNotFoundMemo {
    fn contains(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    async fn insert(&self, key: &str) -> Result<bool, ScrapeError> {
        let _writing = self.write_lock.lock().await;
        let json = {
            let mut keys = self.lock();
            if !keys.insert(key.to_string()) {
                return Ok(false);
            }
            match self.path {
                Some(_) => to_json(&keys)?,
                None => return Ok(true),
            }
        };
        if let Some(path) = &self.path {
            write_json(path, json).await?;
        }
        Ok(true)
    }
}
