//! File system utilities: permission checks and atomic writes.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::core::error::{Error, Result};

/// Check if a file has secure permissions (0600 on Unix).
#[cfg(unix)]
pub fn has_secure_permissions(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode();
        (mode & 0o077) == 0 // Only owner has permissions
    } else {
        false
    }
}

#[cfg(not(unix))]
pub fn has_secure_permissions(_path: &Path) -> bool {
    true // Not applicable on non-Unix systems
}

/// Set permission bits on an existing file.
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| Error::file_access(path, e))
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Create `dir` (and parents) if missing, with mode 0700.
pub fn ensure_private_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| Error::file_access(dir, e))?;
        set_mode(dir, 0o700)?;
    }
    Ok(())
}

/// Atomically replace `path` with `bytes`.
///
/// Writes to a sibling tempfile in the same directory, applies `mode`,
/// fsyncs, then renames into place. The target is never observable
/// truncated, and no tempfile remains after success.
pub fn atomic_write(path: &Path, bytes: &[u8], mode: u32) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".kiln-tmp-")
        .tempfile_in(&dir)
        .map_err(|e| Error::file_access(&dir, e))?;

    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| Error::file_access(path, e))?;

    set_mode(tmp.path(), mode)?;

    tmp.persist(path)
        .map_err(|e| Error::file_access(path, e.error))?;
    Ok(())
}
