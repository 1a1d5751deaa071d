//! Error types for glTF decoding and encoding.

use std::io;
use thiserror::Error;

/// Broad failure category of an [`Error`].
///
/// Callers that only need to know *why* a call failed (bad container,
/// quota, host I/O or a malformed entity) can match on this instead of
/// the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Container framing is broken (magic, version, truncation, chunk order).
    Format,
    /// A caller-configured quota would be exceeded.
    QuotaExceeded,
    /// Host resource I/O failed or a reference escapes the sandbox.
    Resource,
    /// An entity in the document is invalid.
    InvalidEntity,
}

/// Main error type for glTF operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Container magic does not match
    #[error("Invalid GLB container: expected glTF magic bytes")]
    InvalidMagic,

    /// Unsupported container version
    #[error("Unsupported GLB version: {0}")]
    UnsupportedVersion(u32),

    /// Stream is truncated before the declared length
    #[error("Unexpected end of stream at byte {0}")]
    UnexpectedEof(u64),

    /// Container has a header but no JSON chunk follows
    #[error("GLB container has no JSON chunk")]
    MissingJsonChunk,

    /// Chunk layout violates the container rules
    #[error("Invalid GLB chunk: {0}")]
    InvalidChunk(String),

    /// Too many buffers
    #[error("Buffer count {count} exceeds quota of {max}")]
    BufferCountExceeded { count: usize, max: usize },

    /// Cumulative materialized size would exceed the memory quota
    #[error("Allocating {requested} bytes on top of {allocated} exceeds memory quota of {max}")]
    MemoryExceeded { requested: u64, allocated: u64, max: u64 },

    /// Reference escapes the resource sandbox
    #[error("Resource reference escapes sandbox: {0}")]
    PathTraversal(String),

    /// Host reader failed
    #[error("Failed to read resource '{uri}': {source}")]
    ResourceRead {
        uri: String,
        #[source]
        source: io::Error,
    },

    /// Host writer failed
    #[error("Failed to write resource '{uri}': {source}")]
    ResourceWrite {
        uri: String,
        #[source]
        source: io::Error,
    },

    /// Resource delivered fewer bytes than declared
    #[error("Resource '{uri}' is {actual} bytes, expected {expected}")]
    ShortRead { uri: String, expected: u64, actual: u64 },

    /// Buffer entity is invalid
    #[error("Invalid buffer {index}: {reason}")]
    InvalidBuffer { index: usize, reason: String },

    /// Buffer expects the binary chunk but cannot have it
    #[error("Buffer {index} has no uri and no binary chunk is available to it")]
    MissingBinaryChunk { index: usize },

    /// Embedded data URI is malformed
    #[error("Invalid embedded resource: {0}")]
    InvalidEmbedded(String),

    /// JSON document is malformed
    #[error("Invalid glTF JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// I/O error on the container stream itself
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidMagic
            | Self::UnsupportedVersion(_)
            | Self::UnexpectedEof(_)
            | Self::MissingJsonChunk
            | Self::InvalidChunk(_) => ErrorKind::Format,
            Self::BufferCountExceeded { .. } | Self::MemoryExceeded { .. } => {
                ErrorKind::QuotaExceeded
            }
            Self::PathTraversal(_)
            | Self::ResourceRead { .. }
            | Self::ResourceWrite { .. }
            | Self::ShortRead { .. }
            | Self::Io(_) => ErrorKind::Resource,
            Self::InvalidBuffer { .. }
            | Self::MissingBinaryChunk { .. }
            | Self::InvalidEmbedded(_)
            | Self::InvalidJson(_) => ErrorKind::InvalidEntity,
        }
    }

    /// Create an invalid chunk error.
    pub fn chunk(msg: impl Into<String>) -> Self {
        Self::InvalidChunk(msg.into())
    }

    /// Create an invalid buffer error.
    pub fn invalid_buffer(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidBuffer {
            index,
            reason: reason.into(),
        }
    }
}

/// Result type alias for glTF operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::InvalidMagic;
        assert!(e.to_string().contains("magic"));

        let e = Error::MemoryExceeded { requested: 5, allocated: 2, max: 3 };
        let msg = e.to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::UnsupportedVersion(1).kind(), ErrorKind::Format);
        assert_eq!(
            Error::BufferCountExceeded { count: 1, max: 0 }.kind(),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(Error::PathTraversal("../a".into()).kind(), ErrorKind::Resource);
        assert_eq!(Error::MissingBinaryChunk { index: 1 }.kind(), ErrorKind::InvalidEntity);
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Resource);
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{asset: {}}").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.kind(), ErrorKind::InvalidEntity);
    }
}
