//! Deterministic zip serialization
//!
//! Walks a staging tree in fully sorted path order and emits one archive
//! entry per file or directory. Entry paths always use forward slashes,
//! directory names carry a trailing slash, and permission bits are
//! normalized to exactly two canonical modes so the output is byte-stable
//! across hosts.

use crate::selector::to_forward_slash;
use crate::NarResult;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Canonical mode for sources with any execute bit set
const MODE_EXECUTABLE: u32 = 0o755;

/// Canonical mode for everything else
const MODE_REGULAR: u32 = 0o644;

/// Reduce host permission bits to one of the two canonical modes
///
/// Only owner/group/other read/write/execute survive; anything beyond
/// (setuid, sticky, host quirks) is discarded.
pub fn normalize_permissions(mode: u32) -> u32 {
    if mode & 0o111 != 0 {
        MODE_EXECUTABLE
    } else {
        MODE_REGULAR
    }
}

/// Serialize a staging tree into a zip archive
///
/// File entries are deflated; directory entries are stored zero-length
/// markers. The permission bits land in the upper 16 bits of each entry's
/// external attributes and directory entries additionally carry the
/// MS-DOS directory flag.
pub fn write_archive<W: Write + Seek>(staging_dir: &Path, writer: W) -> NarResult<W> {
    let mut entries: Vec<(String, PathBuf, bool)> = Vec::new();
    for item in WalkDir::new(staging_dir).min_depth(1) {
        let item = item.map_err(std::io::Error::from)?;
        let rel = item
            .path()
            .strip_prefix(staging_dir)
            .unwrap_or(item.path());
        entries.push((
            to_forward_slash(rel),
            item.path().to_path_buf(),
            item.file_type().is_dir(),
        ));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut zip = ZipWriter::new(writer);
    for (name, path, is_dir) in entries {
        let mode = normalize_permissions(host_mode(&path)?);
        if is_dir {
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Stored)
                .unix_permissions(mode);
            zip.add_directory(format!("{name}/"), options)?;
        } else {
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(mode);
            zip.start_file(name, options)?;
            let mut src = File::open(&path)?;
            std::io::copy(&mut src, &mut zip)?;
        }
    }

    Ok(zip.finish()?)
}

/// Read the real permission bits of a staged item
fn host_mode(path: &Path) -> NarResult<u32> {
    let metadata = std::fs::metadata(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Ok(metadata.permissions().mode())
    }
    #[cfg(not(unix))]
    {
        Ok(if metadata.is_dir() {
            MODE_EXECUTABLE
        } else {
            MODE_REGULAR
        })
    }
}
