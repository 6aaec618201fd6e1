//! Lookup parameters and results exchanged with adapters.

use super::{MediaType, PlatformId, RomFile, RomHash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything an adapter needs to resolve one ROM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupParams {
    pub rom: RomFile,
    pub hash: Option<RomHash>,
    pub platform: PlatformId,
    pub media_type: MediaType,
    /// Region names in order of preference (e.g. `["USA", "Europe"]`).
    pub region_preference: Vec<String>,
}

impl LookupParams {
    pub fn new(rom: RomFile, platform: PlatformId, media_type: MediaType) -> Self {
        Self {
            rom,
            hash: None,
            platform,
            media_type,
            region_preference: Vec::new(),
        }
    }

    pub fn with_hash(mut self, hash: RomHash) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.region_preference = regions.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of a single adapter lookup.
///
/// A result is either fully populated (`found == true` with a media URL) or
/// the empty [`ArtworkLookupResult::not_found`] value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkLookupResult {
    pub found: bool,
    pub game_id: Option<String>,
    pub game_name: Option<String>,
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// True when the match was approximate.
    #[serde(default)]
    pub best_effort: bool,
    /// The stem before normalization, kept for approximate matches.
    pub original_name: Option<String>,
}

impl ArtworkLookupResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn found(game_name: impl Into<String>, media_url: impl Into<String>) -> Self {
        Self {
            found: true,
            game_name: Some(game_name.into()),
            media_url: Some(media_url.into()),
            ..Self::default()
        }
    }

    pub fn with_game_id(mut self, id: impl Into<String>) -> Self {
        self.game_id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Mark the result as an approximate match of `original_name`.
    pub fn approximate(mut self, original_name: impl Into<String>) -> Self {
        self.best_effort = true;
        self.original_name = Some(original_name.into());
        self
    }

    /// True when the result can end a fallback chain.
    pub fn is_usable(&self) -> bool {
        self.found
            && self
                .media_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty())
    }
}
