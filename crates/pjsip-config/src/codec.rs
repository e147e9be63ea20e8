//! Ordered codec allow-lists

use crate::error::{ConfigStoreError, Result};
use crate::validation::validate_codec_name;
use std::fmt;
use std::str::FromStr;

/// Codec order used when a user is added without an explicit list
pub const DEFAULT_CODECS: &[&str] = &["opus", "alaw", "ulaw", "g729", "gsm"];

/// An ordered, non-empty list of codec names.
///
/// Order is preference order: the server offers the first entry first. The
/// on-disk form is the comma-joined list used as the `allow` option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecList(Vec<String>);

impl CodecList {
    /// Build a list from individual codec names, validating each one
    pub fn new<I, S>(codecs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for codec in codecs {
            let codec = codec.into();
            validate_codec_name(&codec)?;
            if list.contains(&codec) {
                return Err(ConfigStoreError::Validation(format!(
                    "codec {} listed twice",
                    codec
                )));
            }
            list.push(codec);
        }
        if list.is_empty() {
            return Err(ConfigStoreError::Validation(
                "codec list must not be empty".to_string(),
            ));
        }
        Ok(Self(list))
    }

    /// Parse a comma-separated list such as `ulaw,alaw,opus`.
    ///
    /// Whitespace around names is ignored; an empty entry (`gsm,,opus`) is an error.
    pub fn parse(value: &str) -> Result<Self> {
        Self::new(value.split(',').map(str::trim))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The codec offered first
    pub fn preferred(&self) -> &str {
        &self.0[0]
    }
}

impl Default for CodecList {
    fn default() -> Self {
        Self(DEFAULT_CODECS.iter().map(|c| c.to_string()).collect())
    }
}

impl fmt::Display for CodecList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}

impl FromStr for CodecList {
    type Err = ConfigStoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
