//! Error types for the MotorDB storage engine.

use thiserror::Error;

/// The result type used throughout MotorDB.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for MotorDB operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A key was absent where presence was required.
    #[error("not found: {0}")]
    NotFound(String),

    /// An insert or rename collided with an existing key.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A record does not fit its slot, or a field cannot be represented.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Stored bytes failed to parse back into a record.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// A data or index file is structurally damaged.
    #[error("corrupt store: {0}")]
    CorruptStore(String),

    /// An invalid argument was provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Creates a new not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a new duplicate key error.
    pub fn duplicate_key(msg: impl Into<String>) -> Self {
        Error::DuplicateKey(msg.into())
    }

    /// Creates a new encoding error.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Error::Encoding(msg.into())
    }

    /// Creates a new decoding error.
    pub fn decoding(msg: impl Into<String>) -> Self {
        Error::Decoding(msg.into())
    }

    /// Creates a new corrupt store error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::CorruptStore(msg.into())
    }

    /// Creates a new invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
