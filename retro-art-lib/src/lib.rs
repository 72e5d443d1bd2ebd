//! Local side of the artwork pipeline: library scanning, system taxonomy,
//! ROM fingerprints, settings, and the concurrency primitives the scraper
//! builds on.

pub mod async_util;
pub mod error;
pub mod hasher;
pub mod scanner;
pub mod settings;
pub mod systems;
pub mod worker_pool;

pub use error::LibError;
pub use hasher::{RomHashes, compute_hashes, hash_file};
pub use scanner::{RomEntry, RomSystem, scan_library, scan_rom_files};
pub use settings::{AppSettings, load_settings, resolve_library_path};
pub use systems::{SystemInfo, system_info};
pub use worker_pool::WorkerPool;
