use derive_setters::Setters;

use crate::error::{Error, Result};

/// How a write reaches the target file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum WriteMode {
    /// Create or truncate the target, then write.
    #[default]
    Overwrite,
    /// Create the target if absent, then append.
    Append,
    /// Write to a staging file beside the target and rename it into place.
    Atomic,
}

/// Per-call write flags.
///
/// ```
/// use stow_fs::{WriteMode, WriteOptions};
///
/// let options = WriteOptions::default().atomic(true);
/// assert_eq!(options.mode().unwrap(), WriteMode::Atomic);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Setters)]
pub struct WriteOptions {
    pub append: bool,
    pub atomic: bool,
}

impl WriteOptions {
    /// Resolves the flags into a single [`WriteMode`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when both `append` and
    /// `atomic` are set.
    pub fn mode(&self) -> Result<WriteMode> {
        match (self.append, self.atomic) {
            (true, true) => Err(Error::InvalidConfiguration {
                reason: "append and atomic writes are mutually exclusive".to_string(),
            }),
            (true, false) => Ok(WriteMode::Append),
            (false, true) => Ok(WriteMode::Atomic),
            (false, false) => Ok(WriteMode::Overwrite),
        }
    }
}

impl From<WriteMode> for WriteOptions {
    fn from(mode: WriteMode) -> Self {
        match mode {
            WriteMode::Overwrite => WriteOptions::default(),
            WriteMode::Append => WriteOptions::default().append(true),
            WriteMode::Atomic => WriteOptions::default().atomic(true),
        }
    }
}
