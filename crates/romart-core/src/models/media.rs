//! Platform identifiers and media types.

use crate::ArtworkError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Numeric platform identifier.
///
/// Numbering follows the ScreenScraper system table so hash-lookup sources can
/// use ids verbatim; see [`crate::systems`] for names and aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(pub u32);

impl PlatformId {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for PlatformId {
    fn from(id: u32) -> Self {
        PlatformId(id)
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of artwork requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaType {
    /// Front of the retail box.
    BoxFront,
    /// In-game screenshot.
    Screenshot,
    /// Title screen capture.
    TitleScreen,
    /// Transparent logo / wheel art.
    Logo,
}

impl MediaType {
    pub const ALL: [MediaType; 4] = [
        MediaType::BoxFront,
        MediaType::Screenshot,
        MediaType::TitleScreen,
        MediaType::Logo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::BoxFront => "box-front",
            MediaType::Screenshot => "screenshot",
            MediaType::TitleScreen => "title-screen",
            MediaType::Logo => "logo",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = ArtworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "box-front" | "boxfront" | "boxart" | "box" | "box-2d" | "cover" => {
                Ok(MediaType::BoxFront)
            }
            "screenshot" | "snap" | "snapshot" | "ss" => Ok(MediaType::Screenshot),
            "title-screen" | "titlescreen" | "title" | "sstitle" => Ok(MediaType::TitleScreen),
            "logo" | "wheel" | "marquee" => Ok(MediaType::Logo),
            other => Err(ArtworkError::UnknownMediaType(other.to_string())),
        }
    }
}
