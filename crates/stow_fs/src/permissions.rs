use std::fmt;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, IoContext, Result};
use crate::{StowFS, normalize_path};

const SYMBOLS: [char; 3] = ['r', 'w', 'x'];

/// The nine `rwxrwxrwx` permission bits of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionSet(u32);

impl PermissionSet {
    /// `rw-------`
    pub const OWNER_READ_WRITE: PermissionSet = PermissionSet(0o600);
    /// `r--------`
    pub const OWNER_READ_ONLY: PermissionSet = PermissionSet(0o400);

    /// Keeps only the permission bits of `mode`; file type, setuid, setgid
    /// and sticky bits are dropped.
    pub fn from_mode(mode: u32) -> Self {
        Self(mode & 0o777)
    }

    pub fn mode(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in (0..9).rev() {
            let symbol = if self.0 & (1 << bit) != 0 {
                SYMBOLS[2 - bit % 3]
            } else {
                '-'
            };
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}

impl FromStr for PermissionSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 9 {
            return Err(Error::invalid_argument(format!(
                "permission string must have 9 characters: {s:?}"
            )));
        }

        chars
            .iter()
            .enumerate()
            .try_fold(0u32, |mode, (index, &c)| {
                let expected = SYMBOLS[index % 3];
                match c {
                    '-' => Ok(mode),
                    c if c == expected => Ok(mode | 1 << (8 - index)),
                    _ => Err(Error::invalid_argument(format!(
                        "invalid permission string {s:?}: expected '{expected}' or '-' at position {index}"
                    ))),
                }
            })
            .map(PermissionSet)
    }
}

impl StowFS {
    pub fn permissions<P: AsRef<Path>>(path: P) -> Result<PermissionSet> {
        let path = normalize_path(path)?;
        let metadata = fs::metadata(&path).with_path("read permissions of", &path)?;
        Ok(PermissionSet::from_mode(metadata.permissions().mode()))
    }

    /// Sets exactly the given permission bits on `path`.
    pub fn set_permissions<P: AsRef<Path>>(path: P, permissions: PermissionSet) -> Result<()> {
        let path = normalize_path(path)?;
        fs::set_permissions(&path, fs::Permissions::from_mode(permissions.mode()))
            .with_path("set permissions on", &path)
    }

    pub fn set_owner_read_write<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::set_permissions(path, PermissionSet::OWNER_READ_WRITE)
    }

    pub fn set_owner_read_only<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::set_permissions(path, PermissionSet::OWNER_READ_ONLY)
    }

    /// Checks that `path` carries exactly `expected` and returns the
    /// normalized path.
    ///
    /// # Errors
    ///
    /// [`Error::PermissionMismatch`] with both symbolic strings when the bits
    /// differ.
    pub fn assert_permissions<P: AsRef<Path>>(path: P, expected: PermissionSet) -> Result<PathBuf> {
        let path = normalize_path(path)?;
        let actual = Self::permissions(&path)?;
        if actual != expected {
            return Err(Error::PermissionMismatch {
                path,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(path)
    }

    pub fn assert_owner_read_write<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
        Self::assert_permissions(path, PermissionSet::OWNER_READ_WRITE)
    }

    pub fn assert_owner_read_only<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
        Self::assert_permissions(path, PermissionSet::OWNER_READ_ONLY)
    }
}
