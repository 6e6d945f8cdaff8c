use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IoContext, Result};
use crate::{Charset, StowFS, TempArtifact, WriteMode, WriteOptions, ensure_parent, normalize_path};

impl StowFS {
    /// Creates or truncates `path` and writes `payload`, creating parent
    /// directories as needed.
    pub fn write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, payload: C) -> Result<PathBuf> {
        Self::write_with(path, payload, WriteOptions::default())
    }

    /// Replaces `path` with `payload` so that readers observe either the old
    /// or the new content, never a mix.
    pub fn write_atomic<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, payload: C) -> Result<PathBuf> {
        Self::write_with(path, payload, WriteMode::Atomic.into())
    }

    /// Appends `payload` to `path`, creating the file if it does not exist.
    pub fn append<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, payload: C) -> Result<PathBuf> {
        Self::write_with(path, payload, WriteMode::Append.into())
    }

    /// Writes `payload` to `path` using the mode selected by `options` and
    /// returns the normalized target path.
    ///
    /// In atomic mode the payload is staged in a uniquely named file in the
    /// target's directory, synced, then renamed over the target. If staging or
    /// the rename fails the staging file is removed and the original error is
    /// returned.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidConfiguration`] if `append` and `atomic` are
    /// both set (nothing touches the disk in that case), otherwise the I/O
    /// failure of whichever step failed.
    pub fn write_with<P: AsRef<Path>, C: AsRef<[u8]>>(
        path: P,
        payload: C,
        options: WriteOptions,
    ) -> Result<PathBuf> {
        let mode = options.mode()?;
        let path = normalize_path(path)?;
        let payload = payload.as_ref();

        ensure_parent(&path)?;
        match mode {
            WriteMode::Overwrite => fs::write(&path, payload).with_path("write file", &path)?,
            WriteMode::Append => append_to(&path, payload)?,
            WriteMode::Atomic => replace_atomically(&path, payload)?,
        }

        debug!(path = %path.display(), %mode, bytes = payload.len(), "File written");
        Ok(path)
    }

    /// Encodes `text` with `charset` and writes it.
    pub fn write_str<P: AsRef<Path>>(
        path: P,
        text: &str,
        charset: Charset,
        options: WriteOptions,
    ) -> Result<PathBuf> {
        Self::write_with(path, charset.encode(text), options)
    }

    /// Writes each line followed by `\n`.
    pub fn write_lines<P, I, S>(
        path: P,
        lines: I,
        charset: Charset,
        options: WriteOptions,
    ) -> Result<PathBuf>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = lines.into_iter().fold(String::new(), |mut text, line| {
            text.push_str(line.as_ref());
            text.push('\n');
            text
        });
        Self::write_str(path, &text, charset, options)
    }
}

fn append_to(path: &Path, payload: &[u8]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_path("open file for append", path)?;
    file.write_all(payload).with_path("append to file", path)
}

fn replace_atomically(path: &Path, payload: &[u8]) -> Result<()> {
    let existing = fs::metadata(path).ok().map(|metadata| metadata.permissions());
    let mut artifact = TempArtifact::create_beside(path)?;
    let staged = artifact.write_all(payload).and_then(|_| match existing {
        Some(permissions) => artifact.set_permissions(permissions),
        None => Ok(()),
    });
    if let Err(error) = staged {
        artifact.discard();
        return Err(error);
    }
    artifact.persist(path)?;
    Ok(())
}
