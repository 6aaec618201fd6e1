//! Platform table: ids, display names, aliases and libretro thumbnail folders.

use crate::models::PlatformId;
use crate::{ArtworkError, Result};

/// Static description of one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemInfo {
    pub id: PlatformId,
    pub name: &'static str,
    /// Short names accepted on the command line (lowercase).
    pub aliases: &'static [&'static str],
    /// Folder name used by the libretro thumbnail server.
    pub libretro_dir: &'static str,
}

impl SystemInfo {
    /// Repository name under the `libretro-thumbnails` GitHub organisation.
    pub fn github_repo(&self) -> String {
        self.libretro_dir.replace(' ', "_")
    }
}

macro_rules! system {
    ($id:expr, $name:expr, [$($alias:expr),*], $dir:expr) => {
        SystemInfo {
            id: PlatformId($id),
            name: $name,
            aliases: &[$($alias),*],
            libretro_dir: $dir,
        }
    };
}

pub static SYSTEMS: &[SystemInfo] = &[
    system!(1, "Sega Mega Drive / Genesis", ["md", "genesis", "megadrive"], "Sega - Mega Drive - Genesis"),
    system!(2, "Sega Master System", ["sms", "mastersystem"], "Sega - Master System - Mark III"),
    system!(3, "Nintendo Entertainment System", ["nes", "famicom"], "Nintendo - Nintendo Entertainment System"),
    system!(4, "Super Nintendo", ["snes", "sfc", "superfamicom"], "Nintendo - Super Nintendo Entertainment System"),
    system!(9, "Game Boy", ["gb", "gameboy"], "Nintendo - Game Boy"),
    system!(10, "Game Boy Color", ["gbc"], "Nintendo - Game Boy Color"),
    system!(11, "Virtual Boy", ["vb", "virtualboy"], "Nintendo - Virtual Boy"),
    system!(12, "Game Boy Advance", ["gba"], "Nintendo - Game Boy Advance"),
    system!(13, "GameCube", ["gc", "ngc", "gamecube"], "Nintendo - GameCube"),
    system!(14, "Nintendo 64", ["n64"], "Nintendo - Nintendo 64"),
    system!(15, "Nintendo DS", ["nds", "ds"], "Nintendo - Nintendo DS"),
    system!(19, "Sega 32X", ["32x", "sega32x"], "Sega - 32X"),
    system!(20, "Sega CD", ["segacd", "megacd"], "Sega - Mega-CD - Sega CD"),
    system!(21, "Game Gear", ["gg", "gamegear"], "Sega - Game Gear"),
    system!(22, "Sega Saturn", ["saturn"], "Sega - Saturn"),
    system!(23, "Dreamcast", ["dc", "dreamcast"], "Sega - Dreamcast"),
    system!(25, "Neo Geo Pocket", ["ngp"], "SNK - Neo Geo Pocket"),
    system!(26, "Atari 2600", ["a2600", "atari2600"], "Atari - 2600"),
    system!(27, "Atari Jaguar", ["jaguar"], "Atari - Jaguar"),
    system!(28, "Atari Lynx", ["lynx"], "Atari - Lynx"),
    system!(31, "PC Engine / TurboGrafx-16", ["pce", "tg16", "pcengine"], "NEC - PC Engine - TurboGrafx 16"),
    system!(41, "Atari 7800", ["a7800", "atari7800"], "Atari - 7800"),
    system!(45, "WonderSwan", ["ws", "wonderswan"], "Bandai - WonderSwan"),
    system!(46, "WonderSwan Color", ["wsc"], "Bandai - WonderSwan Color"),
    system!(48, "ColecoVision", ["coleco", "colecovision"], "Coleco - ColecoVision"),
    system!(57, "PlayStation", ["psx", "ps1", "playstation"], "Sony - PlayStation"),
    system!(61, "PlayStation Portable", ["psp"], "Sony - PlayStation Portable"),
    system!(75, "Arcade (MAME)", ["mame", "arcade"], "MAME"),
    system!(82, "Neo Geo Pocket Color", ["ngpc"], "SNK - Neo Geo Pocket Color"),
];

/// Look up a platform by numeric id.
pub fn by_id(id: PlatformId) -> Option<&'static SystemInfo> {
    SYSTEMS.iter().find(|s| s.id == id)
}

/// Look up a platform by alias (case-insensitive).
pub fn by_alias(alias: &str) -> Option<&'static SystemInfo> {
    let alias = alias.trim().to_lowercase();
    SYSTEMS.iter().find(|s| s.aliases.contains(&alias.as_str()))
}

/// Resolve a command-line platform argument: a numeric id or an alias.
pub fn resolve(value: &str) -> Result<PlatformId> {
    if let Ok(id) = value.trim().parse::<u32>() {
        return by_id(PlatformId(id))
            .map(|s| s.id)
            .ok_or_else(|| ArtworkError::UnknownPlatform(value.to_string()));
    }
    by_alias(value)
        .map(|s| s.id)
        .ok_or_else(|| ArtworkError::UnknownPlatform(value.to_string()))
}
