//! Common utilities for SqPack.
//!
//! This crate provides foundational types and utilities used across all SqPack crates:
//!
//! - [`BinaryReader`] - Cursor for fixed-layout on-disk records
//! - [`hash`] - The CRC-32 based path hash used as index keys
//! - [`ArchiveIdentity`] - Category/expansion/sequence triple addressing one archive
//! - [`Category`] - The fixed table of archive categories

mod error;
mod id;
mod reader;

pub mod hash;

pub use error::{Error, Result};
pub use id::{ArchiveIdentity, Category};
pub use reader::BinaryReader;

/// zerocopy traits used by every on-disk record.
pub use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

/// Size of the unit used for block offsets inside data containers.
pub const BLOCK_ALIGNMENT: u64 = 0x80;
