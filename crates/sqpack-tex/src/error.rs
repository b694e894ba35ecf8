//! Error types for texture handling.

use thiserror::Error;

/// Errors that can occur when working with textures.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] sqpack_common::Error),

    /// Invalid texture header.
    #[error("invalid texture header: {0}")]
    InvalidHeader(String),

    /// Format code with no known meaning, or none a DDS file can carry.
    #[error("unknown texture format {0:#06x}")]
    UnknownFormat(u32),
}

/// Result type for texture operations.
pub type Result<T> = std::result::Result<T, Error>;
