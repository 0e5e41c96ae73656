//! Error types for the protocol front end and the metadata log reader.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for broker operations.
pub type Result<T> = std::result::Result<T, KraftwireError>;

/// Result alias for primitive wire decoding.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Failures while decoding primitive wire values.
///
/// Kafka varints carry no resync marker, so any of these leaves the
/// surrounding stream unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated input: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("varint longer than 10 bytes")]
    VarintTooLong,

    #[error("invalid UTF-8 in string")]
    InvalidUtf8,

    #[error("invalid length prefix: {0}")]
    InvalidLength(i64),
}

/// Coarse classification of a [`KraftwireError`], used to pick the
/// connection-level reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Socket read/write failure. The connection is closed.
    Transport,
    /// Malformed or truncated bytes inside a frame. The connection is closed.
    Decode,
    /// A request the dispatcher has no shape for (unknown API key).
    Domain,
    /// The metadata log could not be read or decoded.
    MetadataLog,
}

/// Errors that can occur in the broker front end.
#[derive(Error, Debug)]
pub enum KraftwireError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Short frame: expected {expected} bytes, peer closed after {available}")]
    ShortFrame { expected: usize, available: usize },

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(usize),

    #[error("Unsupported API key: {0}")]
    UnsupportedApiKey(i16),

    #[error("Metadata log {path}: {source}")]
    MetadataLog {
        path: PathBuf,
        #[source]
        source: Box<KraftwireError>,
    },
}

impl KraftwireError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Io(_) => ErrorClass::Transport,
            Self::Decode(_) | Self::ShortFrame { .. } | Self::FrameTooLarge(_) => {
                ErrorClass::Decode
            }
            Self::UnsupportedApiKey(_) => ErrorClass::Domain,
            Self::MetadataLog { .. } => ErrorClass::MetadataLog,
        }
    }

    /// Wrap an error raised while reading the segment at `path`.
    pub fn metadata_log(path: impl Into<PathBuf>, source: KraftwireError) -> Self {
        Self::MetadataLog {
            path: path.into(),
            source: Box::new(source),
        }
    }
}
