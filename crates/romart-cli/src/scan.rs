//! Turning command-line paths into batch items.

use anyhow::{Context, Result};
use romart_core::{BatchItem, RomFile, RomHash};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Read size for hashing; disc images run to hundreds of megabytes.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Expand files and directories into ROM files, sorted by path.
///
/// Directories are walked recursively; hidden entries are skipped. A path
/// that does not exist is an error.
pub fn collect_roms(paths: &[PathBuf]) -> Result<Vec<RomFile>> {
    let mut roms = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
            {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Skipping unreadable entry under {}: {}", path.display(), e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                roms.push(RomFile::from_path(entry.path())?);
            }
        } else {
            let rom = RomFile::from_path(path)
                .with_context(|| format!("Cannot read ROM {}", path.display()))?;
            roms.push(rom);
        }
    }

    roms.sort_by(|a, b| a.path.cmp(&b.path));
    roms.dedup_by(|a, b| a.path == b.path);
    debug!("Collected {} ROM files", roms.len());
    Ok(roms)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// MD5 of a file's contents, read in fixed-size chunks.
pub fn md5_file(path: &Path) -> Result<RomHash> {
    let mut file =
        File::open(path).with_context(|| format!("Cannot hash {}", path.display()))?;

    let mut context = md5::Context::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .with_context(|| format!("Cannot hash {}", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        context.consume(&buffer[..bytes_read]);
    }

    Ok(RomHash::md5(format!("{:x}", context.finalize())))
}

/// Wrap ROMs as batch items, hashing each when `hash` is set.
pub fn to_items(roms: Vec<RomFile>, hash: bool) -> Result<Vec<BatchItem>> {
    roms.into_iter()
        .map(|rom| {
            let hash = if hash { Some(md5_file(&rom.path)?) } else { None };
            Ok(BatchItem { rom, hash })
        })
        .collect()
}
