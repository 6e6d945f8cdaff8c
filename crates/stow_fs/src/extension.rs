//! Pure string manipulation of file extensions. Nothing here touches the
//! disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Returns the extension without its leading dot, if any.
pub fn extension(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .extension()
        .map(|ext| ext.to_string_lossy().to_string())
}

/// Replaces the extension. An empty `ext` removes it.
pub fn with_extension(path: impl AsRef<Path>, ext: &str) -> PathBuf {
    path.as_ref().with_extension(ext.trim_start_matches('.'))
}

/// Appends `ext` after any existing extension: `a.tar` becomes `a.tar.gz`.
pub fn add_extension(path: impl AsRef<Path>, ext: &str) -> PathBuf {
    let path = path.as_ref();
    let ext = ext.trim_start_matches('.');
    if ext.is_empty() || path.file_name().is_none() {
        return path.to_path_buf();
    }

    let mut raw = OsString::from(path.as_os_str());
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

pub fn remove_extension(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref().with_extension("")
}
