//! Atomic file writes using the write-rename pattern.
//!
//! Both variants write to `{path}.tmp`, call `sync_all()` so the bytes reach
//! persistent storage, then rename onto the final path. A crash mid-write
//! leaves any existing file at `path` untouched.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically write `data` to `path`.
pub fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    atomic_write_chunks(path, data, std::iter::empty())
}

/// Atomically write a header followed by a stream of body chunks to `path`.
///
/// Chunks are written to the temp file as they are produced, so the full
/// output never has to exist in memory at once.
pub fn atomic_write_chunks(
    path: &Path,
    header: &[u8],
    chunks: impl Iterator<Item = Vec<u8>>,
) -> std::io::Result<()> {
    let tmp_path = tmp_path_for(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(&tmp_path)?;
    file.write_all(header)?;
    for chunk in chunks {
        file.write_all(&chunk)?;
    }
    file.sync_all()?;

    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp: OsString = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
