//! Stored file headers.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// Header prefix shared by every stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct FileHeader {
    /// Size of the whole header, type-specific part and tables included.
    pub header_size: u32,
    pub file_type: u32,
    /// Size of the decoded file.
    pub file_size: u32,
    pub block_count: u32,
    pub used_block_count: u32,
}

impl FileHeader {
    pub const SIZE: usize = 0x14;

    /// Upper bound accepted for `header_size`.
    pub const MAX_HEADER_SIZE: u32 = 0x10_0000;

    pub fn kind(&self) -> Result<FileType> {
        FileType::from_tag(self.file_type)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let header_size = self.header_size;
        if (header_size as usize) < Self::SIZE || header_size > Self::MAX_HEADER_SIZE {
            return Err(Error::CorruptBlock(format!(
                "file header size {header_size:#x} out of range"
            )));
        }
        Ok(())
    }
}

/// Kind of a stored file, from the header's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Generic,
    Model,
    Texture,
}

impl FileType {
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            1 => Ok(Self::Generic),
            2 => Ok(Self::Model),
            3 => Ok(Self::Texture),
            other => Err(Error::UnsupportedFileType(other)),
        }
    }

    pub const fn tag(self) -> u32 {
        match self {
            Self::Generic => 1,
            Self::Model => 2,
            Self::Texture => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Model => "model",
            Self::Texture => "texture",
        }
    }
}

/// Entry of a generic file's block table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BlockInfo {
    /// Offset of the block from the end of the file header.
    pub offset: u32,
    pub compressed_size: u16,
    pub uncompressed_size: u16,
}

impl BlockInfo {
    pub const SIZE: usize = 8;
}

/// Offsets inside a generic file header.
pub(crate) mod generic {
    /// Number of [`super::BlockInfo`] records.
    pub const BLOCK_INFO_COUNT: usize = 0x14;
    pub const BLOCK_INFO_TABLE: usize = 0x18;
}

/// Offsets inside a texture file header.
pub(crate) mod texture {
    pub const LOD_COUNT: usize = 0x14;
    pub const LOD_TABLE: usize = 0x18;
}

/// Fixed part of a model file header.
///
/// Arrays are indexed by LOD. The block-length table starts right after it.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct ModelHeader {
    pub common: FileHeader,
    pub version: u32,
    pub stack_memory_size: u32,
    pub runtime_memory_size: u32,
    pub vertex_buffer_size: [u32; 3],
    pub edge_geometry_vertex_buffer_size: [u32; 3],
    pub index_buffer_size: [u32; 3],
    pub compressed_stack_memory_size: u32,
    pub compressed_runtime_memory_size: u32,
    pub compressed_vertex_buffer_size: [u32; 3],
    pub compressed_edge_geometry_vertex_buffer_size: [u32; 3],
    pub compressed_index_buffer_size: [u32; 3],
    pub stack_memory_offset: u32,
    pub runtime_memory_offset: u32,
    pub vertex_buffer_offset: [u32; 3],
    pub edge_geometry_vertex_buffer_offset: [u32; 3],
    pub index_buffer_offset: [u32; 3],
    pub stack_block_index: u16,
    pub runtime_block_index: u16,
    pub vertex_buffer_block_index: [u16; 3],
    pub edge_geometry_vertex_buffer_block_index: [u16; 3],
    pub index_buffer_block_index: [u16; 3],
    pub stack_block_count: u16,
    pub runtime_block_count: u16,
    pub vertex_buffer_block_count: [u16; 3],
    pub edge_geometry_vertex_buffer_block_count: [u16; 3],
    pub index_buffer_block_count: [u16; 3],
    pub vertex_declaration_count: u16,
    pub material_count: u16,
    pub lod_count: u8,
    pub index_buffer_streaming: u8,
    pub edge_geometry: u8,
    pub padding: u8,
}

impl ModelHeader {
    /// Size of the fixed part; the block-length table follows.
    pub const SIZE: usize = 0xD0;

    /// Smallest header that still has room for one table entry.
    pub const MIN_HEADER_SIZE: usize = 0xD4;

    /// Number of LODs with buffers, capped to the three slots.
    pub fn lods(&self) -> usize {
        usize::from(self.lod_count).min(3)
    }

    pub fn index_buffer_streaming(&self) -> bool {
        self.index_buffer_streaming != 0
    }

    pub fn has_edge_geometry(&self) -> bool {
        self.edge_geometry != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_layout() {
        assert_eq!(size_of::<FileHeader>(), FileHeader::SIZE);
        assert_eq!(size_of::<BlockInfo>(), BlockInfo::SIZE);
        assert_eq!(size_of::<ModelHeader>(), ModelHeader::SIZE);
    }

    #[test]
    fn test_model_offsets() {
        assert_eq!(offset_of!(ModelHeader, version), 0x14);
        assert_eq!(offset_of!(ModelHeader, vertex_buffer_size), 0x20);
        assert_eq!(offset_of!(ModelHeader, compressed_stack_memory_size), 0x44);
        assert_eq!(offset_of!(ModelHeader, stack_memory_offset), 0x70);
        assert_eq!(offset_of!(ModelHeader, index_buffer_offset), 0x90);
        assert_eq!(offset_of!(ModelHeader, stack_block_index), 0x9C);
        assert_eq!(offset_of!(ModelHeader, stack_block_count), 0xB2);
        assert_eq!(offset_of!(ModelHeader, vertex_declaration_count), 0xC8);
        assert_eq!(offset_of!(ModelHeader, lod_count), 0xCC);
        assert_eq!(offset_of!(ModelHeader, edge_geometry), 0xCE);
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(FileType::from_tag(1).unwrap(), FileType::Generic);
        assert_eq!(FileType::from_tag(2).unwrap(), FileType::Model);
        assert_eq!(FileType::from_tag(3).unwrap(), FileType::Texture);
        assert!(matches!(FileType::from_tag(4), Err(Error::UnsupportedFileType(4))));
        assert!(matches!(FileType::from_tag(0), Err(Error::UnsupportedFileType(0))));
    }

    #[test]
    fn test_header_size_bounds() {
        let mut header = FileHeader {
            header_size: 0x80,
            file_type: 1,
            file_size: 0,
            block_count: 0,
            used_block_count: 0,
        };
        header.validate().unwrap();
        header.header_size = 4;
        assert!(header.validate().is_err());
        header.header_size = u32::MAX;
        assert!(header.validate().is_err());
    }
}
