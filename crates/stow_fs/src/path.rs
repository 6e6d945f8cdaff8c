use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Converts a path-like value into the canonical form used by every StowFS
/// operation.
///
/// Normalization is lexical only: `.` components are dropped and repeated or
/// trailing separators collapse. `..` is kept as written and symlinks are not
/// resolved, so no I/O happens here.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an empty path or one containing a
/// NUL byte.
pub fn normalize_path(input: impl AsRef<Path>) -> Result<PathBuf> {
    let input = input.as_ref();
    if input.as_os_str().is_empty() {
        return Err(Error::invalid_argument("path must not be empty"));
    }
    if input.as_os_str().as_encoded_bytes().contains(&0) {
        return Err(Error::invalid_argument(format!(
            "path contains a NUL byte: {}",
            input.display()
        )));
    }

    let normalized: PathBuf = input
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();

    if normalized.as_os_str().is_empty() {
        Ok(PathBuf::from("."))
    } else {
        Ok(normalized)
    }
}
