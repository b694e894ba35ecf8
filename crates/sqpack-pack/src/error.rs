//! Error types for the pack crate.

use thiserror::Error;

/// Errors that can occur when reading SqPack archives.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] sqpack_common::Error),

    /// Index error.
    #[error("{0}")]
    Index(#[from] sqpack_index::Error),

    /// Texture header error.
    #[error("{0}")]
    Texture(#[from] sqpack_tex::Error),

    /// No index of the archive knows the file.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A data container ended before the requested range.
    #[error("short read from dat{container} at {offset:#x}: expected {expected} bytes, got {actual}")]
    ShortRead {
        container: u8,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// Container id outside the 3-bit range.
    #[error("invalid data container id {0}")]
    InvalidContainer(u8),

    /// Malformed block or file header.
    #[error("corrupt block: {0}")]
    CorruptBlock(String),

    /// A compressed block inflated to the wrong length.
    #[error("decompressed block is {actual} bytes, header declares {expected}")]
    DecompressionSizeMismatch { expected: usize, actual: usize },

    /// File type tag other than generic, model or texture.
    #[error("unsupported file type {0}")]
    UnsupportedFileType(u32),
}

impl Error {
    /// Whether the error means "no such file" rather than a broken archive.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::FileNotFound(_) => true,
            Self::Index(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// Result type for pack operations.
pub type Result<T> = std::result::Result<T, Error>;
