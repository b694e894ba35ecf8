//! Index file headers.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// SqPack version header, the first 1024 bytes of every index file.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct VersionInfo {
    /// `SqPack` zero-padded to 8 bytes
    pub magic: [u8; 8],
    /// Platform id (0 = win32)
    pub platform_id: u8,
    pub padding: [u8; 3],
    /// Declared header size, always 0x400
    pub size: u32,
    pub version: u32,
    /// File kind (2 = index)
    pub kind: u32,
    pub date: u32,
    pub time: u32,
    pub region_id: u32,
    pub language_id: u32,
    pub reserved: [u8; 0x398],
    /// SHA-1 of the preceding bytes, zero padded
    pub self_hash: [u8; 64],
}

impl VersionInfo {
    /// Magic literal at offset 0.
    pub const MAGIC: [u8; 8] = *b"SqPack\0\0";

    /// Declared size every valid header carries.
    pub const SIZE: u32 = 0x400;
}

/// Index metadata header, directly after [`VersionInfo`].
///
/// Every table offset is absolute from the start of the index file.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct IndexFileInfo {
    pub size: u32,
    pub version: u32,
    /// Main hash table
    pub index_data_offset: u32,
    pub index_data_size: u32,
    pub index_data_hash: [u8; 64],
    /// Number of `datN` containers
    pub data_file_count: u32,
    /// Synonym (collision) table
    pub synonym_data_offset: u32,
    pub synonym_data_size: u32,
    pub synonym_data_hash: [u8; 64],
    pub empty_block_data_offset: u32,
    pub empty_block_data_size: u32,
    pub empty_block_data_hash: [u8; 64],
    /// Directory table
    pub dir_index_data_offset: u32,
    pub dir_index_data_size: u32,
    pub dir_index_data_hash: [u8; 64],
    /// 2 for the narrow (`index2`) layout
    pub index_type: u32,
    pub reserved: [u8; 0x290],
    pub self_hash: [u8; 64],
}

impl IndexFileInfo {
    /// Declared size of this header.
    pub const SIZE: u32 = 0x400;
}
