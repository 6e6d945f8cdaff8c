use std::fs::{self, File, Permissions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, PersistError};
use tracing::debug;

use crate::error::{Error, IoContext, Result};

/// Marker appended to every staging file name.
pub(crate) const TEMP_MARKER: &str = ".tmp";

/// A short-lived staging file placed in the same directory as the file it
/// will eventually replace.
///
/// The artifact is removed when dropped unless [`TempArtifact::persist`]
/// renamed it into place first, so an operation that bails out early never
/// leaves a partial file behind.
#[derive(Debug)]
pub struct TempArtifact {
    inner: NamedTempFile,
}

impl TempArtifact {
    /// Creates a uniquely named, empty staging file next to `target`.
    ///
    /// The name is `.<target file name>.<random><TEMP_MARKER>`. Keeping it in
    /// the target's directory keeps the final rename on one filesystem.
    pub fn create_beside(target: &Path) -> Result<Self> {
        let file_name = target.file_name().ok_or_else(|| {
            Error::invalid_argument(format!("path has no file name: {}", target.display()))
        })?;
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut prefix = std::ffi::OsString::from(".");
        prefix.push(file_name);
        prefix.push(".");

        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(TEMP_MARKER);
        // Same creation mode as `fs::write`, so the umask decides.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(Permissions::from_mode(0o666));
        }
        let inner = builder
            .tempfile_in(dir)
            .with_path("create temporary file in", dir)?;

        Ok(Self { inner })
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub fn as_file_mut(&mut self) -> &mut File {
        self.inner.as_file_mut()
    }

    /// Writes the whole payload and flushes it to stable storage.
    pub fn write_all(&mut self, payload: &[u8]) -> Result<()> {
        let path = self.path().to_path_buf();
        self.inner
            .write_all(payload)
            .with_path("write temporary file", &path)?;
        self.sync()
    }

    pub fn sync(&mut self) -> Result<()> {
        let path = self.path().to_path_buf();
        self.inner
            .as_file()
            .sync_all()
            .with_path("sync temporary file", &path)
    }

    pub fn set_permissions(&self, permissions: Permissions) -> Result<()> {
        fs::set_permissions(self.path(), permissions)
            .with_path("set permissions on temporary file", self.path())
    }

    /// Atomically renames the artifact onto `target`, replacing any file
    /// already there. On failure the artifact is deleted and the rename error
    /// is returned.
    pub fn persist(self, target: &Path) -> Result<PathBuf> {
        match self.inner.persist(target) {
            Ok(_) => {
                debug!(path = %target.display(), "Renamed temporary file into place");
                Ok(target.to_path_buf())
            }
            Err(PersistError { error, file }) => {
                Self { inner: file }.discard();
                Err(Error::io("rename temporary file onto", target, error))
            }
        }
    }

    /// Deletes the artifact. A failed delete is logged and otherwise ignored
    /// so it never replaces the error the caller is already handling.
    pub fn discard(self) {
        let path = self.path().to_path_buf();
        if let Err(error) = self.inner.close() {
            debug!(path = %path.display(), %error, "Failed to remove temporary file");
        }
    }
}
