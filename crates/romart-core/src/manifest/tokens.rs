//! Classification of bracketed filename tokens.
//!
//! No-Intro / Redump / GoodTools names carry parenthesised and bracketed
//! groups after the title: `Mario Bros (USA) (Rev 1) [!]`. Every item inside
//! a group falls into one class of a fixed rule table:
//!
//! | Class   | Examples                                            | Stripped |
//! |---------|-----------------------------------------------------|----------|
//! | Region  | `USA`, `Europe`, `Japan`, `World`, `En`, `Pt-BR`    | no       |
//! | Quality | `Unl`, `Pirate`, `Hack`, `Homebrew`, `[!]`, `[b1]`  | no       |
//! | Variant | `Beta 2`, `Proto`, `Rev A`, `v1.1`, `1993-05-12`, `Virtual Console` | yes |
//! | Unknown | `Disc 1`, `Made in Brazil`                          | no       |
//!
//! A group is a variant group only when every comma-separated item in it is a
//! variant; otherwise it takes the class of its first non-variant item.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

/// Region and country names (lowercase).
const REGIONS: &[&str] = &[
    "usa", "europe", "japan", "world", "asia", "australia", "brazil", "canada", "china",
    "france", "germany", "hong kong", "italy", "korea", "netherlands", "spain", "sweden",
    "taiwan", "uk", "united kingdom", "russia", "scandinavia", "greece", "portugal", "denmark",
    "finland", "norway", "poland", "mexico", "argentina", "india", "latin america", "belgium",
    "austria", "switzerland", "new zealand", "south africa", "ireland", "israel", "turkey",
    "unknown",
];

/// Language codes (lowercase), optionally followed by a script/region suffix.
const LANGUAGES: &[&str] = &[
    "en", "ja", "fr", "de", "es", "it", "nl", "pt", "sv", "no", "da", "fi", "zh", "ko", "ru",
    "pl", "ca", "cs", "hu", "el", "tr", "ar", "he", "hr", "sk", "sl", "ro", "bg", "uk",
];

/// Tokens that change what the dump *is*; never stripped.
const QUALITY: &[&str] = &[
    "unl", "unlicensed", "pirate", "hack", "aftermarket", "homebrew", "bootleg", "bios",
    "bad dump", "translated",
];

/// Re-release platform markers (lowercase).
const RERELEASE_PLATFORMS: &[&str] = &[
    "virtual console",
    "switch online",
    "nintendo switch online",
    "gamecube",
    "gamecube edition",
    "wii",
    "wii u",
    "3ds",
    "classic mini",
    "snes classic",
    "nes classic",
    "mega drive mini",
    "genesis mini",
    "evercade",
    "steam",
    "gog",
    "e-reader",
    "limited run games",
    "retro-bit",
    "iam8bit",
    "sega ages",
    "namco museum",
    "capcom classics mini mix",
    "collection of mana",
    "arcade archives",
];

static DEV_STAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(beta|proto|prototype|alpha|demo|sample|preview|pre-release|prerelease|promo|debug|kiosk|alt|test program)( ?[0-9]+| [a-z])?$",
    )
    .unwrap()
});

static REVISION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rev ?[0-9a-z]+(\.[0-9a-z]+)*$").unwrap());

static VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(v|version )[0-9]+(\.[0-9]+)*[a-z]?$").unwrap());

static DASHED_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})(-([0-9]{2}))?$").unwrap());

static COMPACT_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{8}$").unwrap());

static GOODTOOLS_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(!|[abfhopt][0-9]*|h[0-9]+c|t[+-].*|cr .*)$").unwrap());

/// Class of a token group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Region,
    Quality,
    Variant,
    Unknown,
}

/// Bracket style of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    Paren,
    Square,
}

/// One bracketed group of a name, with its byte span in the source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGroup<'a> {
    /// Text between the brackets.
    pub inner: &'a str,
    pub bracket: Bracket,
    pub start: usize,
    pub end: usize,
}

impl TokenGroup<'_> {
    /// Items of the group; square groups are a single item.
    pub fn items(&self) -> Vec<&str> {
        match self.bracket {
            Bracket::Paren => self.inner.split([',', '+']).map(str::trim).collect(),
            Bracket::Square => vec![self.inner.trim()],
        }
    }

    pub fn class(&self) -> TokenClass {
        let classes: Vec<TokenClass> = self
            .items()
            .into_iter()
            .map(|item| classify_item(item, self.bracket))
            .collect();

        classes
            .iter()
            .copied()
            .find(|c| *c != TokenClass::Variant)
            .unwrap_or(TokenClass::Variant)
    }
}

/// Title portion of a name: everything before the first `(` or `[`.
pub fn base_title(name: &str) -> &str {
    let end = name.find(['(', '[']).unwrap_or(name.len());
    name[..end].trim()
}

/// Split out every closed bracket group. Unclosed brackets are left as text.
pub fn groups(name: &str) -> Vec<TokenGroup<'_>> {
    let mut result = Vec::new();
    let mut offset = 0;

    while let Some(rel) = name[offset..].find(['(', '[']) {
        let start = offset + rel;
        let (bracket, close) = if name[start..].starts_with('(') {
            (Bracket::Paren, ')')
        } else {
            (Bracket::Square, ']')
        };

        match name[start + 1..].find(close) {
            Some(len) => {
                let end = start + 1 + len + 1;
                result.push(TokenGroup {
                    inner: &name[start + 1..end - 1],
                    bracket,
                    start,
                    end,
                });
                offset = end;
            }
            None => break,
        }
    }

    result
}

/// Classify a single group item.
pub fn classify_item(item: &str, bracket: Bracket) -> TokenClass {
    let lower = item.trim().to_lowercase();
    if lower.is_empty() {
        return TokenClass::Unknown;
    }

    if bracket == Bracket::Square && GOODTOOLS_FLAG.is_match(&lower) {
        return TokenClass::Quality;
    }
    if QUALITY.contains(&lower.as_str()) {
        return TokenClass::Quality;
    }
    if is_region(&lower) || is_language(&lower) {
        return TokenClass::Region;
    }
    if is_variant(&lower) {
        return TokenClass::Variant;
    }
    TokenClass::Unknown
}

/// Remove every variant group and normalize the remaining spacing.
pub fn strip_variants(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut cursor = 0;

    for group in groups(name) {
        if group.class() == TokenClass::Variant {
            out.push_str(&name[cursor..group.start]);
            cursor = group.end;
        }
    }
    out.push_str(&name[cursor..]);

    collapse_whitespace(&out)
}

/// Lowercased region names carried by region groups, in order of appearance.
pub fn regions(name: &str) -> Vec<String> {
    groups(name)
        .iter()
        .filter(|g| g.class() == TokenClass::Region)
        .flat_map(|g| g.items())
        .map(str::to_lowercase)
        .filter(|item| is_region(item))
        .collect()
}

/// Number of variant groups in a name.
pub fn variant_count(name: &str) -> usize {
    groups(name)
        .iter()
        .filter(|g| g.class() == TokenClass::Variant)
        .count()
}

pub(crate) fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_region(lower: &str) -> bool {
    REGIONS.contains(&lower)
}

fn is_language(lower: &str) -> bool {
    let primary = lower.split('-').next().unwrap_or(lower);
    LANGUAGES.contains(&primary) && lower.len() <= 7
}

fn is_variant(lower: &str) -> bool {
    DEV_STAGE.is_match(lower)
        || REVISION.is_match(lower)
        || VERSION.is_match(lower)
        || is_build_date(lower)
        || RERELEASE_PLATFORMS.contains(&lower)
        || lower.ends_with(" virtual console")
}

fn is_build_date(lower: &str) -> bool {
    if let Some(caps) = DASHED_DATE.captures(lower) {
        let day = caps.get(4).map(|m| m.as_str()).unwrap_or("01");
        let candidate = format!("{}-{}-{}", &caps[1], &caps[2], day);
        return NaiveDate::parse_from_str(&candidate, "%Y-%m-%d").is_ok();
    }
    if COMPACT_DATE.is_match(lower) {
        return NaiveDate::parse_from_str(lower, "%Y%m%d").is_ok();
    }
    false
}
