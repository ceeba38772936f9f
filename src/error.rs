//! Error types for the replay codec.
//!
//! Every variant carries the byte offset at which the failure was detected, so a
//! caller can point at the exact spot in a broken recording.

use std::str::Utf8Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReplayError>;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The buffer ended before a field was complete.
    #[error("truncated input at offset {offset}: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A byte that must map onto a closed set of values did not.
    #[error("invalid {field} value {value} at offset {offset}")]
    InvalidEnumValue {
        offset: usize,
        field: &'static str,
        value: i64,
    },

    /// Structurally malformed data: bad string presence byte, bad frame record,
    /// bad life-bar entry, varint overflow.
    #[error("invalid format at offset {offset}: {detail}")]
    InvalidFormat { offset: usize, detail: String },

    /// The frame block could not be compressed or decompressed.
    #[error("compression failure at offset {offset}: {source}")]
    CompressionFailure {
        offset: usize,
        #[source]
        source: CompressionError,
    },

    /// Bytes that should have been UTF-8 text were not.
    #[error("invalid UTF-8 at offset {offset}: {source}")]
    EncodingFailure {
        offset: usize,
        #[source]
        source: Utf8Error,
    },
}

impl ReplayError {
    /// Byte offset at which the error was detected.
    pub fn offset(&self) -> usize {
        match self {
            ReplayError::TruncatedInput { offset, .. }
            | ReplayError::InvalidEnumValue { offset, .. }
            | ReplayError::InvalidFormat { offset, .. }
            | ReplayError::CompressionFailure { offset, .. }
            | ReplayError::EncodingFailure { offset, .. } => *offset,
        }
    }

    pub(crate) fn invalid_format(offset: usize, detail: impl Into<String>) -> Self {
        ReplayError::InvalidFormat {
            offset,
            detail: detail.into(),
        }
    }
}

/// Failure reported by a [`crate::compression::CompressionCodec`].
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("{codec} compression failed: {msg}")]
    Compress { codec: &'static str, msg: String },

    #[error("{codec} decompression failed: {msg}")]
    Decompress { codec: &'static str, msg: String },
}
