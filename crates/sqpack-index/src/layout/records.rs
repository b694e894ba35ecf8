//! Table records.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::PackedLocation;

/// Length of the literal path stored in a synonym record.
pub const SYNONYM_PATH_LEN: usize = 240;

/// Directory table record.
///
/// `offset`/`size` delimit the directory's slice of the main hash table.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DirectoryRecord {
    pub dir_hash: u32,
    pub offset: u32,
    pub size: u32,
    pub reserved: u32,
}

impl DirectoryRecord {
    pub const SIZE: usize = 16;
}

/// A fixed-size hash-table record of either index variant.
pub trait HashRecord: FromBytes + Copy {
    /// Record size in bytes.
    const SIZE: usize;

    /// Stored key, zero-extended for narrow records.
    fn key(&self) -> u64;

    /// Location word.
    fn location(&self) -> PackedLocation;
}

/// `.index` hash-table record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct WideHashRecord {
    /// `(dir_hash << 32) | file_hash`
    pub key: u64,
    pub location: u32,
    pub padding: u32,
}

impl HashRecord for WideHashRecord {
    const SIZE: usize = 16;

    #[inline]
    fn key(&self) -> u64 {
        self.key
    }

    #[inline]
    fn location(&self) -> PackedLocation {
        PackedLocation::from_raw(self.location)
    }
}

/// `.index2` hash-table record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct NarrowHashRecord {
    pub key: u32,
    pub location: u32,
}

impl HashRecord for NarrowHashRecord {
    const SIZE: usize = 8;

    #[inline]
    fn key(&self) -> u64 {
        u64::from(self.key)
    }

    #[inline]
    fn location(&self) -> PackedLocation {
        PackedLocation::from_raw(self.location)
    }
}

/// A synonym table record of either index variant.
pub trait SynonymRecord: FromBytes + Copy {
    /// Record size in bytes.
    const SIZE: usize = 0x100;

    fn key(&self) -> u64;
    fn location(&self) -> PackedLocation;
    fn synonym_index(&self) -> u32;
    /// NUL-padded literal path.
    fn path_bytes(&self) -> [u8; SYNONYM_PATH_LEN];
}

/// `.index` synonym record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct WideSynonymRecord {
    pub key: u64,
    pub location: u32,
    pub synonym_index: u32,
    pub path: [u8; SYNONYM_PATH_LEN],
}

impl SynonymRecord for WideSynonymRecord {
    fn key(&self) -> u64 {
        self.key
    }

    fn location(&self) -> PackedLocation {
        PackedLocation::from_raw(self.location)
    }

    fn synonym_index(&self) -> u32 {
        self.synonym_index
    }

    fn path_bytes(&self) -> [u8; SYNONYM_PATH_LEN] {
        self.path
    }
}

/// `.index2` synonym record.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct NarrowSynonymRecord {
    pub key: u32,
    pub reserved: u32,
    pub location: u32,
    pub synonym_index: u32,
    pub path: [u8; SYNONYM_PATH_LEN],
}

impl SynonymRecord for NarrowSynonymRecord {
    fn key(&self) -> u64 {
        u64::from(self.key)
    }

    fn location(&self) -> PackedLocation {
        PackedLocation::from_raw(self.location)
    }

    fn synonym_index(&self) -> u32 {
        self.synonym_index
    }

    fn path_bytes(&self) -> [u8; SYNONYM_PATH_LEN] {
        self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_record_sizes() {
        assert_eq!(size_of::<DirectoryRecord>(), DirectoryRecord::SIZE);
        assert_eq!(size_of::<WideHashRecord>(), WideHashRecord::SIZE);
        assert_eq!(size_of::<NarrowHashRecord>(), NarrowHashRecord::SIZE);
        assert_eq!(size_of::<WideSynonymRecord>(), WideSynonymRecord::SIZE);
        assert_eq!(size_of::<NarrowSynonymRecord>(), NarrowSynonymRecord::SIZE);
    }

    #[test]
    fn test_narrow_record_decode() {
        let bytes = [0x78, 0x56, 0x34, 0x12, 0x23, 0x00, 0x00, 0x00];
        let record = NarrowHashRecord::read_from_bytes(&bytes).unwrap();
        assert_eq!(record.key(), 0x1234_5678);
        assert!(record.location().is_synonym());
        assert_eq!(record.location().container_id(), 1);
        assert_eq!(record.location().block_offset(), 2);
    }
}
