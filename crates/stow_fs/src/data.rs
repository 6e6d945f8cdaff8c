use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::{Charset, StowFS, WriteOptions, normalize_path};

impl StowFS {
    /// Serializes `value` as YAML, encodes it with `charset` and writes it
    /// using `options`.
    pub fn write_data<P: AsRef<Path>, T: Serialize + ?Sized>(
        path: P,
        value: &T,
        charset: Charset,
        options: WriteOptions,
    ) -> Result<PathBuf> {
        let path = normalize_path(path)?;
        let text = serde_yml::to_string(value).map_err(|source| Error::Serialization {
            operation: "serialize",
            path: path.clone(),
            source,
        })?;
        Self::write_str(path, &text, charset, options)
    }

    /// Reads YAML written by [`StowFS::write_data`]. Reading with a different
    /// charset than the one used for writing may produce a different value.
    pub fn read_data<P: AsRef<Path>, T: DeserializeOwned>(path: P, charset: Charset) -> Result<T> {
        let path = normalize_path(path)?;
        let text = Self::read_to_string(&path, charset)?;
        serde_yml::from_str(&text).map_err(|source| Error::Serialization {
            operation: "deserialize",
            path,
            source,
        })
    }
}
