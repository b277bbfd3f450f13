//! Errors produced while encoding or decoding XDR data.
//!
//! Wire-format problems are kept apart from bound violations so that the
//! procedure dispatcher can log exactly why an argument was rejected, while
//! still answering every one of them with the same protocol status.

use std::io;

use thiserror::Error;

/// Convenience alias used by every `Serialize`/`Deserialize` implementation.
pub type Result<T> = std::result::Result<T, Error>;

/// XDR codec failure.
#[derive(Debug, Error)]
pub enum Error {
    /// The input ended before the value was complete.
    #[error("truncated message")]
    TruncatedMessage,

    /// A file handle did not have the fixed handle size.
    #[error("malformed file handle: expected {expected} bytes, got {actual}")]
    MalformedHandle { expected: usize, actual: usize },

    /// Opaque data exceeded its declared maximum.
    #[error("argument too large: {len} bytes exceeds limit of {max}")]
    ArgumentTooLarge { len: usize, max: usize },

    /// A file name exceeded the maximum name length.
    #[error("name too long: {len} bytes exceeds limit of {max}")]
    NameTooLong { len: usize, max: usize },

    /// A path exceeded the maximum path length.
    #[error("path too long: {len} bytes exceeds limit of {max}")]
    PathTooLong { len: usize, max: usize },

    /// The bytes were well framed but do not describe a legal value.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Writing to or reading from the underlying stream failed.
    #[error("i/o error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::TruncatedMessage,
            _ => Error::Io(err),
        }
    }
}

impl Error {
    /// Builds an [`Error::InvalidData`] from any message.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Error::InvalidData(msg.into())
    }
}
