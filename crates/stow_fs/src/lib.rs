//! # StowFS
//!
//! Safe whole-file read/write primitives over the local filesystem.
//!
//! StowFS wraps `std::fs` with consistent, kinded errors. Every failure
//! carries the path it happened on and reads as "Failed to [operation]
//! [path]", while preserving the original `io::Error` as its source.
//!
//! On top of plain reads and writes it offers:
//!
//! - atomic writes (write to a staging file in the target's directory, then
//!   rename it into place), so readers see either the old or the new content;
//! - an atomic move that falls back to copy-then-rename when source and
//!   destination live on different filesystems;
//! - exact POSIX permission setting and assertion (Unix only).
//!
//! All operations are blocking and stateless.

mod charset;
mod data;
mod error;
mod extension;
mod meta;
mod moves;
mod options;
mod parent;
mod path;
#[cfg(unix)]
mod permissions;
mod read;
mod temp;
mod write;

pub use charset::{Charset, IntoCharset, resolve_charset};
pub use error::{Error, ErrorKind, Result};
pub use extension::{add_extension, extension, remove_extension, with_extension};
pub use options::{WriteMode, WriteOptions};
pub use parent::ensure_parent;
pub use path::normalize_path;
#[cfg(unix)]
pub use permissions::PermissionSet;
pub use temp::TempArtifact;

/// StowFS provides a standardized interface for file system operations
/// with consistent error handling.
#[derive(Debug)]
pub struct StowFS;
