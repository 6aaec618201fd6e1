//! Manifest-based filename matching.
//!
//! A manifest is the full list of canonical artwork names a source holds for
//! one (platform, media type). It is fetched once, indexed, and every ROM stem
//! is then resolved locally.

mod cache;
mod index;
mod listing;
pub mod tokens;

pub use cache::{ManifestCache, ManifestKey};
pub use index::{normalize_key, ManifestIndex, ManifestMatch, MatchTier};
pub use listing::{parse_git_tree, parse_html_listing, TreeListing};
