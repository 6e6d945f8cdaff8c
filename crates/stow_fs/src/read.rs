use std::fs;
use std::path::Path;

use crate::error::{IoContext, Result};
use crate::{Charset, StowFS, normalize_path};

impl StowFS {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        let path = normalize_path(path)?;
        fs::read(&path).with_path("read file", &path)
    }

    /// Reads the whole file and decodes it with `charset`. Malformed input is
    /// replaced rather than rejected.
    pub fn read_to_string<P: AsRef<Path>>(path: P, charset: Charset) -> Result<String> {
        Ok(charset.decode(&Self::read(path)?))
    }

    pub fn read_utf8<P: AsRef<Path>>(path: P) -> Result<String> {
        Self::read_to_string(path, Charset::Utf8)
    }

    /// Reads the file as lines. Both `\n` and `\r\n` terminate a line, and a
    /// trailing terminator does not produce an empty last line.
    pub fn read_lines<P: AsRef<Path>>(path: P, charset: Charset) -> Result<Vec<String>> {
        let text = Self::read_to_string(path, charset)?;
        Ok(text.lines().map(str::to_string).collect())
    }
}
