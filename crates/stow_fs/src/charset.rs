use std::str::FromStr;

use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};

/// Text encodings understood by the text and line helpers.
///
/// Decoding is lossy: malformed input becomes U+FFFD, and characters the
/// target encoding cannot represent are written as `?`. Reading text back
/// with a different charset than it was written with is therefore allowed and
/// simply yields different text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Charset {
    #[default]
    #[strum(to_string = "UTF-8", serialize = "UTF8")]
    Utf8,
    #[strum(to_string = "UTF-16LE", serialize = "UTF16LE")]
    Utf16Le,
    #[strum(to_string = "UTF-16BE", serialize = "UTF16BE")]
    Utf16Be,
    #[strum(
        to_string = "ISO-8859-1",
        serialize = "ISO8859-1",
        serialize = "ISO_8859_1",
        serialize = "LATIN1"
    )]
    Iso8859_1,
    #[strum(to_string = "US-ASCII", serialize = "ASCII")]
    UsAscii,
}

impl Charset {
    /// Looks up a charset by name, ignoring ASCII case and surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the name is not recognized.
    pub fn resolve(name: &str) -> Result<Self> {
        Charset::from_str(name.trim())
            .map_err(|_| Error::invalid_argument(format!("unsupported charset: {name}")))
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Charset::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Charset::Iso8859_1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Charset::UsAscii => text
                .chars()
                .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                .collect(),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Utf16Le => decode_utf16(bytes, u16::from_le_bytes),
            Charset::Utf16Be => decode_utf16(bytes, u16::from_be_bytes),
            Charset::Iso8859_1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Charset::UsAscii => bytes
                .iter()
                .map(|&b| {
                    if b.is_ascii() {
                        char::from(b)
                    } else {
                        char::REPLACEMENT_CHARACTER
                    }
                })
                .collect(),
        }
    }
}

/// Anything that names a charset: a [`Charset`] itself or its name.
pub trait IntoCharset {
    fn into_charset(self) -> Result<Charset>;
}

impl IntoCharset for Charset {
    fn into_charset(self) -> Result<Charset> {
        Ok(self)
    }
}

impl IntoCharset for &str {
    fn into_charset(self) -> Result<Charset> {
        Charset::resolve(self)
    }
}

impl IntoCharset for String {
    fn into_charset(self) -> Result<Charset> {
        Charset::resolve(&self)
    }
}

/// Returns a [`Charset`] unchanged, or resolves a name with
/// [`Charset::resolve`].
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if a name is not recognized.
pub fn resolve_charset<C: IntoCharset>(charset: C) -> Result<Charset> {
    charset.into_charset()
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let chunks = bytes.chunks_exact(2);
    let dangling = !chunks.remainder().is_empty();
    let units: Vec<u16> = chunks.map(|pair| unit([pair[0], pair[1]])).collect();

    let mut text = String::from_utf16_lossy(&units);
    if dangling {
        text.push(char::REPLACEMENT_CHARACTER);
    }
    text
}
