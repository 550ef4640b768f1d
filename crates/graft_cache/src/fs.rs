//! Filesystem primitives with cache error mapping.

use std::path::Path;

use crate::error::CacheError;

/// Ensures all parent directories exist for a path.
pub fn ensure_parent_dirs(path: &Path) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CacheError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Writes a file atomically (write to `<name>.tmp`, then rename).
///
/// A crash mid-write leaves the previous file intact.
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<(), CacheError> {
    ensure_parent_dirs(path)?;
    let tmp_path = path.with_extension(format!(
        "{}.tmp",
        path.extension().and_then(|s| s.to_str()).unwrap_or("tmp")
    ));
    std::fs::write(&tmp_path, contents).map_err(|e| CacheError::Io {
        path: tmp_path.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Removes a file, treating an already-missing file as success.
///
/// Returns `true` if a file was deleted.
pub fn remove_if_exists(path: &Path) -> Result<bool, CacheError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
