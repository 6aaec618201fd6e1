//! Naming conventions shared by the libretro thumbnail sources.

use super::PlatformSupport;
use crate::manifest::{ManifestIndex, ManifestMatch};
use crate::models::{ArtworkLookupResult, LookupParams, MediaType, PlatformId};
use crate::systems::{self, SystemInfo};
use crate::ArtworkError;

/// Media types the thumbnail sets carry.
pub(crate) const MEDIA_TYPES: [MediaType; 3] = [
    MediaType::BoxFront,
    MediaType::Screenshot,
    MediaType::TitleScreen,
];

/// Characters the thumbnail sets replace with `_` in file names.
const RESERVED_CHARS: &[char] = &['&', '*', '/', ':', '`', '<', '>', '?', '\\', '|', '"'];

/// Directory holding one media type inside a system folder.
pub(crate) fn media_dir(media: MediaType) -> Option<&'static str> {
    match media {
        MediaType::BoxFront => Some("Named_Boxarts"),
        MediaType::Screenshot => Some("Named_Snaps"),
        MediaType::TitleScreen => Some("Named_Titles"),
        MediaType::Logo => None,
    }
}

pub(crate) fn sanitize_name(stem: &str) -> String {
    stem.chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Every platform in the systems table has a thumbnail folder.
pub(crate) fn supported_platforms() -> PlatformSupport {
    PlatformSupport::Only(systems::SYSTEMS.iter().map(|s| s.id).collect())
}

/// System folder and media directory for a lookup, if the source has one.
pub(crate) fn target(
    platform: PlatformId,
    media: MediaType,
) -> Option<(&'static SystemInfo, &'static str)> {
    Some((systems::by_id(platform)?, media_dir(media)?))
}

pub(crate) fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Run the three-tier match for the ROM stem in `params`.
pub(crate) fn resolve(index: &ManifestIndex, params: &LookupParams) -> Option<ManifestMatch> {
    index.resolve(&params.rom.stem, sanitize_name, &params.region_preference)
}

pub(crate) fn to_result(matched: ManifestMatch, media_url: String, source: &str) -> ArtworkLookupResult {
    let result = ArtworkLookupResult::found(matched.name, media_url)
        .with_metadata("source", source)
        .with_metadata("match_tier", matched.tier.as_str());

    match matched.original_name {
        Some(original) if matched.best_effort => result.approximate(original),
        _ => result,
    }
}

/// Wrap a listing failure with the key it was fetched for.
pub(crate) fn manifest_error(platform: PlatformId, media: MediaType, err: ArtworkError) -> ArtworkError {
    match err {
        ArtworkError::Manifest { .. } => err,
        other => ArtworkError::Manifest {
            platform: platform.get(),
            media: media.to_string(),
            message: other.to_string(),
        },
    }
}
