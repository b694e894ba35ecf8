//! Error types for the index crate.

use thiserror::Error;

/// Errors that can occur when working with index files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] sqpack_common::Error),

    /// Header validation failed or a table lies outside the file.
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// No directory with the requested hash.
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    /// No file with the requested hash in the directory.
    #[error("file not found: {0}")]
    FileNotFound(String),
}

impl Error {
    /// Whether the error only reports a missing directory or file.
    ///
    /// Callers probing several indexes fall through on these.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::DirectoryNotFound(_) | Self::FileNotFound(_))
    }
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, Error>;
