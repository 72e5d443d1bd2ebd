use std::fmt;

use crate::types::Media;

/// Region tags tried in order when several assets share a media type.
pub const REGION_PRIORITY: &[&str] = &["us", "eu", "wor"];

/// Kind of artwork fetched per ROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtworkCategory {
    BoxFront,
    Wheel,
    Screenshot,
}

impl ArtworkCategory {
    pub const ALL: [ArtworkCategory; 3] = [Self::BoxFront, Self::Wheel, Self::Screenshot];

    /// File name the artwork is stored under.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::BoxFront => "boxFront.png",
            Self::Wheel => "wheel.png",
            Self::Screenshot => "screenshot.png",
        }
    }

    /// Remote media type tags that satisfy this category, best first.
    pub fn media_types(self) -> &'static [&'static str] {
        match self {
            Self::BoxFront => &["box-2D", "box-2D-back"],
            Self::Wheel => &["wheel-hd", "wheel"],
            Self::Screenshot => &["ss", "sstitle"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BoxFront => "box",
            Self::Wheel => "wheel",
            Self::Screenshot => "screenshot",
        }
    }

    /// Parse a user-supplied category name (e.g. "box", "ss").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "box" | "boxfront" | "box-front" | "cover" => Some(Self::BoxFront),
            "wheel" | "marquee" => Some(Self::Wheel),
            "screenshot" | "ss" => Some(Self::Screenshot),
            _ => None,
        }
    }

    /// Parse a list of names, deduplicated in canonical order. Unknown names
    /// are returned as the error.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, String> {
        let mut out = Vec::new();
        for name in names {
            let name = name.as_ref();
            let cat = Self::from_name(name).ok_or_else(|| name.to_string())?;
            if !out.contains(&cat) {
                out.push(cat);
            }
        }
        out.sort();
        Ok(out)
    }
}

impl fmt::Display for ArtworkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick the best asset URL for a category.
///
/// Media types are tried in the category's order. Within the first type that
/// has any asset, the first asset of the best-ranked region wins, falling back
/// to the first asset of that type.
pub fn select_media_url(medias: &[Media], category: ArtworkCategory) -> Option<&str> {
    category.media_types().iter().find_map(|&media_type| {
        let candidates: Vec<&Media> = medias
            .iter()
            .filter(|m| m.media_type == media_type)
            .collect();
        REGION_PRIORITY
            .iter()
            .find_map(|region| candidates.iter().copied().find(|m| m.region == *region))
            .or_else(|| candidates.first().copied())
            .map(|m| m.url.as_str())
    })
}
