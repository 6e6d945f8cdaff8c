use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Creates every missing ancestor directory of `path`.
///
/// A path without a parent (a filesystem root or a bare file name) is a
/// no-op. Losing a creation race to another thread or process is fine as
/// long as the directory exists afterwards.
pub fn ensure_parent(path: impl AsRef<Path>) -> Result<()> {
    let Some(parent) = path.as_ref().parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    match fs::create_dir_all(parent) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && parent.is_dir() => Ok(()),
        Err(e) => Err(Error::io("create parent directories for", path.as_ref(), e)),
    }
}
