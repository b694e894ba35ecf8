//! Error types for sqpack-common.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A read ran past the end of the buffer.
    #[error("unexpected end of buffer: needed {needed} bytes but only {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    /// The first path segment does not name a known archive category.
    #[error("unknown archive category in path: {0}")]
    UnknownCategory(String),
}

pub type Result<T> = std::result::Result<T, Error>;
