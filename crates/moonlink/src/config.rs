//! Converter configuration
//!
//! Both settings are fixed when a converter is built. They can come from code,
//! from the process environment, or from any serde format the host already
//! uses for its own configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable toggling raw-byte-array mode
pub const ENV_RAW_BYTE_ARRAY: &str = "MOONLINK_RAW_BYTE_ARRAY";

/// Environment variable selecting the text encoding
pub const ENV_TEXT_ENCODING: &str = "MOONLINK_TEXT_ENCODING";

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Unrecognized text encoding name
    #[error("unknown text encoding: {0}")]
    UnknownEncoding(String),

    /// An environment variable holds an unusable value
    #[error("invalid value for {var}: {value}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Encoding used between runtime byte strings and host text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    /// UTF-8; invalid sequences decode to U+FFFD
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    /// ISO-8859-1; every byte is one character
    #[serde(rename = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl TextEncoding {
    /// Decode runtime bytes into text
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }

    /// Encode host text into runtime bytes.
    ///
    /// Characters Latin-1 cannot hold become `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }

    /// Decode only if the text encodes back to exactly `bytes`
    pub fn decode_exact(self, bytes: &[u8]) -> Option<String> {
        let text = self.decode(bytes);
        if self.encode(&text) == bytes {
            Some(text)
        } else {
            None
        }
    }

    /// Canonical name
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin1",
        }
    }
}

impl FromStr for TextEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            _ => Err(ConfigError::UnknownEncoding(s.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Converter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Keep byte sequences and text apart: `Bytes` is neither a target for
    /// strings and numbers nor exported as a runtime string
    pub raw_byte_array: bool,

    /// Encoding between runtime strings and host text
    pub text_encoding: TextEncoding,
}

impl ConverterConfig {
    /// Default configuration (UTF-8, byte arrays convertible)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set raw-byte-array mode
    pub fn with_raw_byte_array(mut self, raw_byte_array: bool) -> Self {
        self.raw_byte_array = raw_byte_array;
        self
    }

    /// Set the text encoding
    pub fn with_text_encoding(mut self, text_encoding: TextEncoding) -> Self {
        self.text_encoding = text_encoding;
        self
    }

    /// Read the configuration from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_env_vars(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`; unset variables keep defaults
    pub fn from_env_vars(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_RAW_BYTE_ARRAY) {
            config.raw_byte_array = parse_flag(ENV_RAW_BYTE_ARRAY, &value)?;
        }
        if let Some(value) = lookup(ENV_TEXT_ENCODING) {
            config.text_encoding = value.parse()?;
        }

        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}
