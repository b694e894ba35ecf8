//! On-disk index structures.
//!
//! This module contains the low-level structures of `.index` and `.index2`
//! files: the two 1024-byte headers, directory records, the two hash-table
//! record variants and the synonym (collision) records.

mod header;
mod records;

pub use header::{IndexFileInfo, VersionInfo};
pub use records::{
    DirectoryRecord, HashRecord, NarrowHashRecord, NarrowSynonymRecord, SynonymRecord,
    WideHashRecord, WideSynonymRecord, SYNONYM_PATH_LEN,
};

use std::fmt;

/// Index variant, selected by `IndexFileInfo::index_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    /// `.index`: 16-byte records keyed by `(dir_hash << 32) | file_hash`.
    Wide,
    /// `.index2`: 8-byte records keyed by a 32-bit hash.
    Narrow,
}

impl IndexKind {
    /// `index_type` value marking the narrow variant.
    pub const NARROW_INDEX_TYPE: u32 = 2;

    /// Classify an `index_type` header value.
    #[inline]
    pub fn from_index_type(value: u32) -> Self {
        if value == Self::NARROW_INDEX_TYPE {
            Self::Narrow
        } else {
            Self::Wide
        }
    }

    /// Size of one hash-table record.
    #[inline]
    pub const fn record_size(self) -> usize {
        match self {
            Self::Wide => WideHashRecord::SIZE,
            Self::Narrow => NarrowHashRecord::SIZE,
        }
    }
}

/// Bit-packed location word shared by hash-table and synonym records.
///
/// | bits  | width | field                               |
/// |-------|-------|-------------------------------------|
/// | 0     | 1     | synonym flag                        |
/// | 1..=3 | 3     | data container id (`dat0`..`dat7`)  |
/// | 4..=31| 28    | block offset in 128-byte units      |
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedLocation(u32);

impl PackedLocation {
    const SYNONYM_MASK: u32 = 0b1;
    const CONTAINER_SHIFT: u32 = 1;
    const CONTAINER_MASK: u32 = 0b111;
    const OFFSET_SHIFT: u32 = 4;
    const OFFSET_MASK: u32 = 0x0FFF_FFFF;

    /// Highest container id representable in the 3-bit field.
    pub const MAX_CONTAINER_ID: u8 = 7;

    /// Wrap a raw location word.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Pack the fields. Values wider than their field are masked.
    #[inline]
    pub const fn new(is_synonym: bool, container_id: u8, block_offset: u32) -> Self {
        Self(
            (is_synonym as u32)
                | ((container_id as u32 & Self::CONTAINER_MASK) << Self::CONTAINER_SHIFT)
                | ((block_offset & Self::OFFSET_MASK) << Self::OFFSET_SHIFT),
        )
    }

    /// The raw word.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_synonym(self) -> bool {
        self.0 & Self::SYNONYM_MASK != 0
    }

    #[inline]
    pub const fn container_id(self) -> u8 {
        ((self.0 >> Self::CONTAINER_SHIFT) & Self::CONTAINER_MASK) as u8
    }

    /// Offset in 128-byte units.
    #[inline]
    pub const fn block_offset(self) -> u32 {
        (self.0 >> Self::OFFSET_SHIFT) & Self::OFFSET_MASK
    }

    /// Offset in bytes from the start of the data container.
    #[inline]
    pub const fn byte_offset(self) -> u64 {
        (self.block_offset() as u64) << 7
    }
}

impl fmt::Debug for PackedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedLocation")
            .field("is_synonym", &self.is_synonym())
            .field("container_id", &self.container_id())
            .field("block_offset", &self.block_offset())
            .finish()
    }
}
