use std::io;
use thiserror::Error;

/// Result type for package operations
pub type Result<T> = std::result::Result<T, TmodError>;

/// Unified error type for reading, writing and extracting packages
#[derive(Debug, Error)]
pub enum TmodError {
    // Container errors
    #[error("Invalid package header: expected magic \"TMOD\", found {found:?}")]
    InvalidHeader { found: [u8; 4] },

    #[error("Truncated input while reading {context}: needed {expected} bytes")]
    TruncatedInput { context: String, expected: u64 },

    #[error("Invalid UTF-8 in string field: {0}")]
    InvalidEncoding(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Entry not found in package: {0}")]
    EntryNotFound(String),

    // Payload errors
    #[error("Decompression failed: {0}")]
    DecompressionError(String),

    #[error("Malformed raw image: {0}")]
    MalformedImage(String),

    #[error("Image encoding failed: {0}")]
    ImageEncode(String),

    // Path errors
    #[error("Unsafe entry path: {0}")]
    UnsafePath(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl TmodError {
    /// Build a `TruncatedInput` error for a read of `expected` bytes
    pub(crate) fn truncated(context: impl Into<String>, expected: u64) -> Self {
        TmodError::TruncatedInput {
            context: context.into(),
            expected,
        }
    }

    /// Map an I/O error from a fixed-size read, turning EOF into `TruncatedInput`
    pub(crate) fn from_read(err: io::Error, context: &str, expected: u64) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::truncated(context, expected)
        } else {
            TmodError::Io(err)
        }
    }
}

impl From<image::ImageError> for TmodError {
    fn from(err: image::ImageError) -> Self {
        TmodError::ImageEncode(err.to_string())
    }
}
