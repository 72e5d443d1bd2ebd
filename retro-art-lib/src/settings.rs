//! Application settings (library path, scrape defaults).
//!
//! The settings file lives at `~/.config/retro-art/settings.toml`. Missing or
//! unreadable files fall back to defaults so a first run needs no setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LibError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub library: LibrarySettings,
    #[serde(default)]
    pub scrape: ScrapeSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// Library root containing one folder per system
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeSettings {
    /// User cap on concurrent workers. The server allowance still applies.
    pub threads: Option<usize>,
    /// Artwork categories to fetch (e.g. `["box", "wheel"]`). All when unset.
    pub categories: Option<Vec<String>>,
}

/// Directory holding all retro-art config files.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("retro-art")
}

/// Canonical path to the settings file: `~/.config/retro-art/settings.toml`.
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.toml")
}

/// Load settings from the canonical path, returning defaults if missing or corrupt.
pub fn load_settings() -> AppSettings {
    let path = settings_path();
    match load_settings_from(&path) {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Failed to read settings at {}: {}", path.display(), e);
            AppSettings::default()
        }
    }
}

/// Load settings from a specific file. A missing file yields defaults.
pub fn load_settings_from(path: &Path) -> Result<AppSettings, LibError> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

/// Save settings to the canonical path.
pub fn save_settings(settings: &AppSettings) -> Result<(), LibError> {
    save_settings_to(settings, &settings_path())
}

/// Save settings atomically (write to temp, then rename).
pub fn save_settings_to(settings: &AppSettings, path: &Path) -> Result<(), LibError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = toml::to_string_pretty(settings)?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Resolve the library root using a priority chain:
///
/// 1. CLI override (if `Some`)
/// 2. `library.root` from the settings
/// 3. Current working directory
pub fn resolve_library_path(cli_override: Option<PathBuf>, settings: &AppSettings) -> PathBuf {
    cli_override
        .or_else(|| settings.library.root.clone())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}
