use std::io;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], for callers that branch on the
/// kind of failure rather than on its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidConfiguration,
    NotFound,
    PermissionMismatch,
    Io,
    AtomicMoveUnsupported,
    Serialization,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input was empty or malformed. Raised before any I/O.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Mutually exclusive options were requested together. Raised before any
    /// I/O.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("Failed to {operation} {}: no such file or directory", .path.display())]
    NotFound {
        operation: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    #[error(
        "Permission mismatch on {}: expected {expected}, found {actual}",
        .path.display()
    )]
    PermissionMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Failed to {operation} {}", .path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// The rename crossed a filesystem boundary. Only surfaces when the
    /// copy-based fallback is not taken.
    #[error(
        "Failed to move {} to {} atomically: paths are on different filesystems",
        .from.display(),
        .to.display()
    )]
    AtomicMoveUnsupported {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Failed to {operation} structured data at {}", .path.display())]
    Serialization {
        operation: &'static str,
        path: PathBuf,
        source: serde_yml::Error,
    },
}

impl Error {
    /// Wraps an I/O failure, classifying `NotFound` separately so callers can
    /// tell a missing file from any other storage failure.
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound { operation, path, source }
        } else {
            Error::Io { operation, path, source }
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument { reason: reason.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::PermissionMismatch { .. } => ErrorKind::PermissionMismatch,
            Error::Io { .. } => ErrorKind::Io,
            Error::AtomicMoveUnsupported { .. } => ErrorKind::AtomicMoveUnsupported,
            Error::Serialization { .. } => ErrorKind::Serialization,
        }
    }

    /// True for failures of the underlying storage, including the
    /// cross-filesystem rename failure.
    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. } | Error::AtomicMoveUnsupported { .. })
    }
}

/// Attaches the operation and path to a raw `io::Result`.
pub(crate) trait IoContext<T> {
    fn with_path(self, operation: &'static str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn with_path(self, operation: &'static str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::io(operation, path, source))
    }
}
