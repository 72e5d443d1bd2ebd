//! Folder name → remote system taxonomy.
//!
//! System IDs are the remote catalog's numeric identifiers. Several folder
//! aliases map to the same system (e.g. `genesis`, `megadrive` and `md`).

/// A system known to the remote catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemInfo {
    /// Remote catalog system ID
    pub id: u32,
    /// Human-readable system name
    pub display_name: &'static str,
}

const fn sys(id: u32, display_name: &'static str) -> SystemInfo {
    SystemInfo { id, display_name }
}

/// Normalised folder alias → system. Aliases are lowercase with `-`, `_` and
/// spaces removed.
static SYSTEMS: &[(&str, SystemInfo)] = &[
    // Nintendo
    ("nes", sys(3, "Nintendo Entertainment System")),
    ("famicom", sys(3, "Nintendo Entertainment System")),
    ("snes", sys(4, "Super Nintendo")),
    ("superfamicom", sys(4, "Super Nintendo")),
    ("n64", sys(14, "Nintendo 64")),
    ("gamecube", sys(13, "Nintendo GameCube")),
    ("gc", sys(13, "Nintendo GameCube")),
    ("wii", sys(16, "Nintendo Wii")),
    ("wiiu", sys(18, "Nintendo Wii U")),
    ("switch", sys(225, "Nintendo Switch")),
    ("gb", sys(9, "Game Boy")),
    ("gameboy", sys(9, "Game Boy")),
    ("gbc", sys(10, "Game Boy Color")),
    ("gameboycolor", sys(10, "Game Boy Color")),
    ("gba", sys(12, "Game Boy Advance")),
    ("gameboyadvance", sys(12, "Game Boy Advance")),
    ("nds", sys(15, "Nintendo DS")),
    ("ds", sys(15, "Nintendo DS")),
    ("3ds", sys(17, "Nintendo 3DS")),
    ("n3ds", sys(17, "Nintendo 3DS")),
    ("nintendo3ds", sys(17, "Nintendo 3DS")),
    ("virtualboy", sys(11, "Virtual Boy")),
    // Sega
    ("genesis", sys(1, "Sega Genesis")),
    ("megadrive", sys(1, "Sega Genesis")),
    ("md", sys(1, "Sega Genesis")),
    ("mastersystem", sys(2, "Sega Master System")),
    ("sms", sys(2, "Sega Master System")),
    ("gamegear", sys(21, "Sega Game Gear")),
    ("gg", sys(21, "Sega Game Gear")),
    ("saturn", sys(22, "Sega Saturn")),
    ("dreamcast", sys(23, "Sega Dreamcast")),
    ("dc", sys(23, "Sega Dreamcast")),
    ("segacd", sys(20, "Sega CD")),
    ("scd", sys(20, "Sega CD")),
    ("sega32x", sys(19, "Sega 32X")),
    ("32x", sys(19, "Sega 32X")),
    ("sg1000", sys(109, "Sega SG-1000")),
    // Sony
    ("psx", sys(57, "PlayStation")),
    ("ps1", sys(57, "PlayStation")),
    ("playstation", sys(57, "PlayStation")),
    ("ps2", sys(58, "PlayStation 2")),
    ("ps3", sys(59, "PlayStation 3")),
    ("psp", sys(61, "PlayStation Portable")),
    ("psvita", sys(62, "PlayStation Vita")),
    ("vita", sys(62, "PlayStation Vita")),
    // Atari
    ("atari2600", sys(26, "Atari 2600")),
    ("atari5200", sys(40, "Atari 5200")),
    ("atari7800", sys(41, "Atari 7800")),
    ("atarilynx", sys(28, "Atari Lynx")),
    ("lynx", sys(28, "Atari Lynx")),
    ("atarijaguar", sys(27, "Atari Jaguar")),
    ("jaguar", sys(27, "Atari Jaguar")),
    ("atarist", sys(42, "Atari ST")),
    // NEC
    ("pcengine", sys(31, "PC Engine")),
    ("pce", sys(31, "PC Engine")),
    ("tg16", sys(31, "PC Engine")),
    ("turbografx16", sys(31, "PC Engine")),
    ("pcenginecd", sys(114, "PC Engine CD")),
    ("pcecd", sys(114, "PC Engine CD")),
    ("supergrafx", sys(105, "SuperGrafx")),
    ("sgx", sys(105, "SuperGrafx")),
    // SNK
    ("neogeo", sys(142, "Neo Geo")),
    ("neogeocd", sys(70, "Neo Geo CD")),
    ("ngp", sys(25, "Neo Geo Pocket")),
    ("ngpc", sys(82, "Neo Geo Pocket Color")),
    // Other
    ("arcade", sys(75, "Arcade")),
    ("mame", sys(75, "Arcade")),
    ("fba", sys(75, "Arcade")),
    ("fbneo", sys(75, "Arcade")),
    ("colecovision", sys(48, "ColecoVision")),
    ("intellivision", sys(115, "Intellivision")),
    ("vectrex", sys(102, "Vectrex")),
    ("wonderswan", sys(45, "WonderSwan")),
    ("ws", sys(45, "WonderSwan")),
    ("wonderswancolor", sys(46, "WonderSwan Color")),
    ("wsc", sys(46, "WonderSwan Color")),
    ("msx", sys(113, "MSX")),
    ("msx2", sys(116, "MSX2")),
    ("amstradcpc", sys(65, "Amstrad CPC")),
    ("zxspectrum", sys(76, "ZX Spectrum")),
    ("c64", sys(66, "Commodore 64")),
    ("amiga", sys(64, "Amiga")),
    ("dos", sys(135, "DOS")),
    ("scummvm", sys(123, "ScummVM")),
    ("3do", sys(29, "3DO")),
];

/// Normalise a folder name for alias lookup.
pub fn normalize_folder_name(folder_name: &str) -> String {
    folder_name
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Look up the system a ROM folder belongs to.
pub fn system_info(folder_name: &str) -> Option<SystemInfo> {
    let normalized = normalize_folder_name(folder_name);
    SYSTEMS
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, info)| *info)
}

/// Whether a folder name maps to a known system.
pub fn is_known_system(folder_name: &str) -> bool {
    system_info(folder_name).is_some()
}

/// All known aliases with their systems, in table order.
pub fn known_systems() -> impl Iterator<Item = (&'static str, SystemInfo)> {
    SYSTEMS.iter().copied()
}
