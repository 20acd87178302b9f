//! Resolution of folder shortcuts found in the mirror.
//!
//! Two kinds are understood: filesystem symlinks (and junctions), which the OS
//! resolves for us, and Windows shell links (`.lnk`), whose target is read out
//! of the link's `LinkInfo` block.

use crate::classify::{classify_name, FileKind};
use crate::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

const HEADER_SIZE: usize = 0x4C;
const HAS_LINK_TARGET_ID_LIST: u32 = 0x0000_0001;
const HAS_LINK_INFO: u32 = 0x0000_0002;
const VOLUME_ID_AND_LOCAL_BASE_PATH: u32 = 0x0000_0001;

/// Resolve `entry` to the folder it stands for.
///
/// Plain directories resolve to themselves, symlinks to their canonical target,
/// `.lnk` files to the path stored inside them. Returns `Ok(None)` for entries
/// that are not folders of any kind.
pub fn resolve_folder(entry: &Path) -> Result<Option<PathBuf>, Error> {
    let link_meta = fs::symlink_metadata(entry)?;

    if link_meta.file_type().is_symlink() {
        let target = fs::canonicalize(entry).map_err(|err| Error::Shortcut {
            path: entry.to_path_buf(),
            reason: err.to_string(),
        })?;
        return Ok(target.is_dir().then_some(target));
    }

    if link_meta.is_dir() {
        return Ok(Some(entry.to_path_buf()));
    }

    if classify_name(entry) == FileKind::Shortcut {
        let bytes = fs::read(entry)?;
        let target = parse_lnk_target(&bytes).map_err(|reason| Error::Shortcut {
            path: entry.to_path_buf(),
            reason,
        })?;
        if !target.is_dir() {
            return Err(Error::Shortcut {
                path: entry.to_path_buf(),
                reason: format!("target {} is not a reachable folder", target.display()),
            });
        }
        return Ok(Some(target));
    }

    Ok(None)
}

/// Display name of a folder entry: the file stem for `.lnk` files, the file
/// name otherwise.
pub fn entry_name(entry: &Path) -> String {
    let name = if classify_name(entry) == FileKind::Shortcut {
        entry.file_stem()
    } else {
        entry.file_name()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Extract the local target path from a shell link (MS-SHLLINK).
pub fn parse_lnk_target(bytes: &[u8]) -> Result<PathBuf, String> {
    if read_u32(bytes, 0)? as usize != HEADER_SIZE {
        return Err("not a shell link".to_string());
    }
    let flags = read_u32(bytes, 20)?;
    if flags & HAS_LINK_INFO == 0 {
        return Err("shell link has no LinkInfo".to_string());
    }

    let mut offset = HEADER_SIZE;
    if flags & HAS_LINK_TARGET_ID_LIST != 0 {
        offset += 2 + read_u16(bytes, offset)? as usize;
    }

    let info = bytes
        .get(offset..)
        .ok_or_else(|| "truncated LinkInfo".to_string())?;
    let info_size = read_u32(info, 0)? as usize;
    let info = info
        .get(..info_size)
        .ok_or_else(|| "truncated LinkInfo".to_string())?;
    let header_size = read_u32(info, 4)? as usize;
    let info_flags = read_u32(info, 8)?;
    if info_flags & VOLUME_ID_AND_LOCAL_BASE_PATH == 0 {
        return Err("shell link points at a network location".to_string());
    }

    let base_offset = read_u32(info, 16)? as usize;
    let suffix_offset = read_u32(info, 24)? as usize;

    let (base, suffix) = if header_size >= 0x24 {
        let base_unicode = read_u32(info, 28)? as usize;
        let suffix_unicode = read_u32(info, 32)? as usize;
        (read_utf16z(info, base_unicode)?, read_utf16z(info, suffix_unicode)?)
    } else {
        (read_ansiz(info, base_offset)?, read_ansiz(info, suffix_offset)?)
    };

    if base.is_empty() {
        return Err("shell link has an empty target".to_string());
    }
    Ok(PathBuf::from(format!("{}{}", base, suffix)))
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16, String> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| format!("truncated shell link at offset {}", at))
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32, String> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| format!("truncated shell link at offset {}", at))
}

fn read_ansiz(bytes: &[u8], at: usize) -> Result<String, String> {
    let tail = bytes
        .get(at..)
        .ok_or_else(|| format!("string offset {} out of range", at))?;
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Ok(String::from_utf8_lossy(&tail[..end]).into_owned())
}

fn read_utf16z(bytes: &[u8], at: usize) -> Result<String, String> {
    let tail = bytes
        .get(at..)
        .ok_or_else(|| format!("string offset {} out of range", at))?;
    let units: Vec<u16> = tail
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    Ok(String::from_utf16_lossy(&units))
}
