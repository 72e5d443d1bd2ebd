//! Directory scanner for ROM collections.
//!
//! A library root contains one folder per system (`<root>/snes`, `<root>/psx`,
//! ...). Each recognised system folder yields a [`RomSystem`] listing the ROM
//! files directly inside it.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::systems;

/// File extensions treated as ROM files (compared lowercase).
pub const ROM_EXTENSIONS: &[&str] = &[
    "zip", "7z", "nes", "sfc", "smc", "gb", "gbc", "gba", "n64", "z64", "v64", "nds", "3ds",
    "gen", "md", "smd", "bin", "iso", "cue", "chd", "cso", "pbp", "gcm", "gcz", "rvz", "wbfs",
    "wad", "nsp", "xci", "pce", "sgx", "ngp", "ngc", "ws", "wsc", "col", "int", "a26", "a52",
    "a78", "j64", "lnx", "vec", "rom", "img", "cdi", "gdi",
];

static EXTENSION_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ROM_EXTENSIONS.iter().copied().collect());

/// One ROM file found in a system folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomEntry {
    /// File name including extension (e.g. "Super Mario Bros. (USA).nes")
    pub name: String,
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Name of the system folder the file lives in
    pub system_folder: String,
}

impl RomEntry {
    /// File name with the last extension stripped. Used as the artwork key.
    pub fn rom_stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..idx],
            None => &self.name,
        }
    }

    /// Key under which a failed lookup is remembered: `system-folder/filename`.
    pub fn not_found_key(&self) -> String {
        format!("{}/{}", self.system_folder, self.name)
    }
}

/// A system folder with at least one ROM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomSystem {
    /// Remote catalog system ID
    pub system_id: u32,
    /// Folder name as it appears on disk
    pub folder_name: String,
    /// Human-readable system name
    pub display_name: String,
    /// ROM files, sorted by lowercase name
    pub roms: Vec<RomEntry>,
}

/// Whether a path has a ROM file extension.
pub fn has_rom_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EXTENSION_SET.contains(e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan a library root and return every recognised system that has ROMs.
///
/// Unknown folders, unreadable folders and empty systems are left out. The
/// result is sorted by display name. Only an unreadable `root` is an error.
pub fn scan_library(root: &Path) -> std::io::Result<Vec<RomSystem>> {
    let mut folders: Vec<PathBuf> = std::fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    folders.sort_by_key(|p| file_name_lower(p));
    Ok(collect_systems(&folders))
}

fn collect_systems(folders: &[PathBuf]) -> Vec<RomSystem> {
    let mut result = Vec::new();
    for folder in folders {
        let Some(folder_name) = folder.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(info) = systems::system_info(folder_name) else {
            log::debug!("Skipping unrecognised folder {}", folder.display());
            continue;
        };

        let roms = match scan_rom_files(folder, folder_name) {
            Ok(roms) => roms,
            Err(e) => {
                log::warn!("Skipping {}: {}", folder.display(), e);
                continue;
            }
        };
        if roms.is_empty() {
            log::debug!("Skipping {}: no ROM files", folder.display());
            continue;
        }

        result.push(RomSystem {
            system_id: info.id,
            folder_name: folder_name.to_string(),
            display_name: info.display_name.to_string(),
            roms,
        });
    }

    result.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    result
}

/// List the ROM files directly inside one system folder.
pub fn scan_rom_files(folder: &Path, folder_name: &str) -> std::io::Result<Vec<RomEntry>> {
    let mut files: Vec<(PathBuf, u64)> = std::fs::read_dir(folder)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let meta = e.metadata().ok()?;
            let path = e.path();
            (meta.is_file() && has_rom_extension(&path)).then_some((path, meta.len()))
        })
        .collect();
    files.sort_by_key(|(p, _)| file_name_lower(p));

    Ok(files
        .into_iter()
        .filter_map(|(path, size)| {
            let name = path.file_name()?.to_str()?.to_string();
            Some(RomEntry {
                name,
                path,
                size,
                system_folder: folder_name.to_string(),
            })
        })
        .collect())
}

fn file_name_lower(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}
