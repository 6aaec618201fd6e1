//! Parsers turning source listings into canonical names.

use crate::Result;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Image extension expected in listings.
const IMAGE_EXTENSION: &str = ".png";

static HREF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());

/// Extract image names from an HTML directory listing.
///
/// Every anchor whose target ends in `.png` contributes its percent-decoded
/// file name without the extension. Parent links and query links are skipped.
pub fn parse_html_listing(html: &str) -> Vec<String> {
    HREF.captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .filter(|href| !href.starts_with('?') && !href.starts_with("../"))
        .filter_map(|href| {
            let segment = href.rsplit('/').next().unwrap_or(&href).to_string();
            let decoded = urlencoding::decode(&segment).ok()?.into_owned();
            strip_image_extension(&decoded).map(str::to_string)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct GitTree {
    tree: Vec<GitTreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct GitTreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// A parsed git-tree listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeListing {
    pub names: Vec<String>,
    /// GitHub caps recursive trees; a truncated listing may miss entries.
    pub truncated: bool,
}

/// Extract image names under `directory/` from a GitHub git-tree response.
pub fn parse_git_tree(json: &str, directory: &str) -> Result<TreeListing> {
    let tree: GitTree = serde_json::from_str(json)?;
    let prefix = format!("{}/", directory.trim_end_matches('/'));

    let names = tree
        .tree
        .iter()
        .filter(|entry| entry.kind == "blob")
        .filter_map(|entry| entry.path.strip_prefix(&prefix))
        .filter(|rest| !rest.contains('/'))
        .filter_map(strip_image_extension)
        .map(str::to_string)
        .collect();

    Ok(TreeListing {
        names,
        truncated: tree.truncated,
    })
}

fn strip_image_extension(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(IMAGE_EXTENSION.len())?;
    if !name.is_char_boundary(split) {
        return None;
    }
    let (stem, ext) = name.split_at(split);
    if ext.eq_ignore_ascii_case(IMAGE_EXTENSION) && !stem.is_empty() {
        Some(stem)
    } else {
        None
    }
}
