//! In-memory index over a manifest's canonical names and the three-tier
//! resolution that runs against it.

use super::tokens::{self, collapse_whitespace};
use std::collections::HashMap;

/// Which tier produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    VariantStripped,
    TitleOnly,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::VariantStripped => "variant-stripped",
            MatchTier::TitleOnly => "title-only",
        }
    }
}

/// A resolved manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestMatch {
    /// Canonical name as listed by the source.
    pub name: String,
    pub tier: MatchTier,
    /// True for approximate (title-only) matches.
    pub best_effort: bool,
    /// The stem as supplied by the caller, set for approximate matches.
    pub original_name: Option<String>,
}

/// Lookup structures for one (platform, media type) listing.
#[derive(Debug, Clone, Default)]
pub struct ManifestIndex {
    /// Normalized name -> canonical name.
    exact: HashMap<String, String>,
    /// Normalized variant-stripped name -> first canonical name.
    stripped: HashMap<String, String>,
    /// Normalized base title -> canonical names in listing order.
    titles: HashMap<String, Vec<String>>,
}

impl ManifestIndex {
    /// Build an index from canonical names. Duplicates keep their first position.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::default();
        for name in names {
            index.insert(name.into());
        }
        index
    }

    fn insert(&mut self, name: String) {
        let name = name.trim().to_string();
        if name.is_empty() {
            return;
        }
        let key = normalize_key(&name);
        if self.exact.contains_key(&key) {
            return;
        }

        self.stripped
            .entry(normalize_key(&tokens::strip_variants(&name)))
            .or_insert_with(|| name.clone());
        self.titles
            .entry(normalize_key(tokens::base_title(&name)))
            .or_default()
            .push(name.clone());
        self.exact.insert(key, name);
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.exact.contains_key(&normalize_key(name))
    }

    /// Resolve a ROM stem.
    ///
    /// `sanitize` applies the source's naming convention (e.g. replacing
    /// characters the source cannot store) before any lookup.
    /// `region_preference` ranks title-only candidates.
    pub fn resolve<F>(
        &self,
        stem: &str,
        sanitize: F,
        region_preference: &[String],
    ) -> Option<ManifestMatch>
    where
        F: Fn(&str) -> String,
    {
        let candidate = sanitize(stem);

        if let Some(name) = self.exact.get(&normalize_key(&candidate)) {
            return Some(ManifestMatch {
                name: name.clone(),
                tier: MatchTier::Exact,
                best_effort: false,
                original_name: None,
            });
        }

        let stripped_key = normalize_key(&tokens::strip_variants(&candidate));
        if let Some(name) = self
            .exact
            .get(&stripped_key)
            .or_else(|| self.stripped.get(&stripped_key))
        {
            return Some(ManifestMatch {
                name: name.clone(),
                tier: MatchTier::VariantStripped,
                best_effort: false,
                original_name: None,
            });
        }

        let title_key = normalize_key(tokens::base_title(&candidate));
        if title_key.is_empty() {
            return None;
        }
        let candidates = self.titles.get(&title_key)?;
        let best = best_title_candidate(candidates, region_preference)?;

        Some(ManifestMatch {
            name: best.clone(),
            tier: MatchTier::TitleOnly,
            best_effort: true,
            original_name: Some(stem.to_string()),
        })
    }
}

/// Case-folded, whitespace-collapsed lookup key.
pub fn normalize_key(name: &str) -> String {
    collapse_whitespace(name).to_lowercase()
}

/// Prefer the earliest preferred region, then fewer variant groups; ties keep
/// listing order.
fn best_title_candidate<'a>(
    candidates: &'a [String],
    region_preference: &[String],
) -> Option<&'a String> {
    let preference: Vec<String> = region_preference.iter().map(|r| r.to_lowercase()).collect();

    candidates.iter().min_by_key(|name| {
        let regions = tokens::regions(name);
        let rank = preference
            .iter()
            .position(|preferred| regions.iter().any(|r| r == preferred))
            .unwrap_or(preference.len());
        (rank, tokens::variant_count(name))
    })
}
