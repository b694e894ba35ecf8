//! Texture header structures.

use sqpack_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::format::TextureFormat;
use crate::{Error, Result};

/// Texture header stored in front of the pixel data.
///
/// Read verbatim from the start of a texture's data region; it is not part of
/// the block-compressed stream.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct TextureHeader {
    /// Attribute flags, see [`TextureAttribute`].
    pub attributes: u32,
    /// Packed format code, see [`TextureFormat`].
    pub format: u32,
    pub width: u16,
    pub height: u16,
    pub depth: u16,
    pub mip_levels: u8,
    pub array_size: u8,
    /// First mip level of each of the three LODs.
    pub lod_offsets: [u32; 3],
    /// Offset of each surface, relative to the start of this header.
    pub surface_offsets: [u32; 13],
}

impl TextureHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 0x50;

    /// Number of surface offset slots.
    pub const SURFACE_COUNT: usize = 13;

    /// Read a header from the start of `data`.
    pub fn read(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        Ok(reader.read_struct()?)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    #[inline]
    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Depth, at least 1.
    #[inline]
    pub fn depth(&self) -> u32 {
        u32::from(self.depth).max(1)
    }

    /// Number of mip levels, at least 1.
    #[inline]
    pub fn mip_levels(&self) -> u32 {
        u32::from(self.mip_levels).max(1)
    }

    /// Number of array slices, at least 1.
    #[inline]
    pub fn array_size(&self) -> u32 {
        u32::from(self.array_size).max(1)
    }

    #[inline]
    pub fn attributes(&self) -> TextureAttribute {
        TextureAttribute::from_bits_retain(self.attributes)
    }

    /// Decode the format code.
    pub fn format(&self) -> Result<TextureFormat> {
        TextureFormat::from_code(self.format).ok_or(Error::UnknownFormat(self.format))
    }

    /// Surface offsets actually in use, one per mip level.
    pub fn surfaces(&self) -> Vec<u32> {
        let offsets = self.surface_offsets;
        let count = (self.mip_levels() as usize).min(offsets.len());
        offsets[..count].to_vec()
    }

    /// Reject headers no consumer could make sense of.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidHeader(format!(
                "zero dimension {}x{}",
                self.width(),
                self.height()
            )));
        }
        if self.mip_levels() as usize > Self::SURFACE_COUNT {
            return Err(Error::InvalidHeader(format!(
                "{} mip levels, at most {} supported",
                self.mip_levels(),
                Self::SURFACE_COUNT
            )));
        }
        Ok(())
    }
}

/// Compressed location of one LOD inside a texture file.
///
/// A table of these follows the common file header; `block_count` entries of
/// the block-length table after it belong to this LOD.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct LodBlock {
    /// Offset of the LOD's first block, relative to the end of the file header.
    pub compressed_offset: u32,
    pub compressed_size: u32,
    pub decompressed_size: u32,
    /// Index of the LOD's first entry in the block-length table.
    pub block_offset: u32,
    pub block_count: u32,
}

impl LodBlock {
    pub const SIZE: usize = 0x14;
}

bitflags::bitflags! {
    /// Texture attribute flags.
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TextureAttribute: u32 {
        const DISCARD_PER_FRAME = 1 << 0;
        const DISCARD_PER_MAP = 1 << 1;
        const MANAGED = 1 << 2;
        const USER_MANAGED = 1 << 3;
        const CPU_READ = 1 << 4;
        const LOCATION_MAIN = 1 << 5;
        const NO_GPU_READ = 1 << 6;
        const ALIGNED_SIZE = 1 << 7;
        const EDGE_CULLING = 1 << 8;
        const LOCATION_ONION = 1 << 9;
        const READ_WRITE = 1 << 10;
        const IMMUTABLE = 1 << 11;
        const IMMUTABLE_CPU_READ = 1 << 12;
        const DYNAMIC_NO_DISCARD = 1 << 13;
        const DISCARD_DIRECT_CONSTANT = 1 << 14;
        const CPU_READ_WRITE = 1 << 15;
        const INDIRECT_ARGS = 1 << 16;
        const RENDER_TARGET = 1 << 20;
        const DEPTH_STENCIL = 1 << 21;
        const TYPE_1D = 1 << 22;
        const TYPE_2D = 1 << 23;
        const TYPE_3D = 1 << 24;
        const TYPE_CUBE = 1 << 25;
        const SWIZZLE = 1 << 26;
        const NO_TILED = 1 << 27;
        const TYPE_2D_ARRAY = 1 << 28;
        const NO_SWIZZLE = 1 << 31;
    }
}

impl TextureAttribute {
    #[inline]
    pub fn is_cube(self) -> bool {
        self.contains(Self::TYPE_CUBE)
    }

    #[inline]
    pub fn is_volume(self) -> bool {
        self.contains(Self::TYPE_3D)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};
    use zerocopy::FromZeros;

    #[test]
    fn test_layout() {
        assert_eq!(size_of::<TextureHeader>(), TextureHeader::SIZE);
        assert_eq!(size_of::<LodBlock>(), LodBlock::SIZE);
        assert_eq!(offset_of!(TextureHeader, format), 0x4);
        assert_eq!(offset_of!(TextureHeader, width), 0x8);
        assert_eq!(offset_of!(TextureHeader, height), 0xA);
        assert_eq!(offset_of!(TextureHeader, depth), 0xC);
        assert_eq!(offset_of!(TextureHeader, mip_levels), 0xE);
        assert_eq!(offset_of!(TextureHeader, array_size), 0xF);
        assert_eq!(offset_of!(TextureHeader, lod_offsets), 0x10);
        assert_eq!(offset_of!(TextureHeader, surface_offsets), 0x1C);
    }

    #[test]
    fn test_read_and_accessors() {
        let mut header = TextureHeader::new_zeroed();
        header.attributes = (TextureAttribute::TYPE_2D | TextureAttribute::MANAGED).bits();
        header.format = TextureFormat::Dxt1.code();
        header.width = 256;
        header.height = 128;
        header.mip_levels = 3;
        header.surface_offsets = [0x50, 0x4050, 0x5050, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];

        let parsed = TextureHeader::read(header.as_bytes()).unwrap();
        assert_eq!(parsed.width(), 256);
        assert_eq!(parsed.height(), 128);
        assert_eq!(parsed.depth(), 1);
        assert_eq!(parsed.array_size(), 1);
        assert_eq!(parsed.format().unwrap(), TextureFormat::Dxt1);
        assert_eq!(parsed.surfaces(), vec![0x50, 0x4050, 0x5050]);
        assert!(parsed.attributes().contains(TextureAttribute::TYPE_2D));
        assert!(!parsed.attributes().is_cube());
        parsed.validate().unwrap();
    }

    #[test]
    fn test_invalid_headers() {
        let header = TextureHeader::new_zeroed();
        assert!(matches!(header.validate(), Err(Error::InvalidHeader(_))));
        assert!(matches!(header.format(), Err(Error::UnknownFormat(0))));
        assert!(TextureHeader::read(&[0u8; 0x20]).is_err());
    }

    #[test]
    fn test_attribute_debug() {
        let flags = TextureAttribute::TYPE_CUBE | TextureAttribute::IMMUTABLE;
        let text = format!("{flags:?}");
        assert!(text.contains("IMMUTABLE"));
        assert!(text.contains("TYPE_CUBE"));
        assert!(flags.is_cube());
    }

    #[test]
    fn test_mip_level_limit() {
        let mut header = TextureHeader::new_zeroed();
        header.width = 4;
        header.height = 4;
        header.mip_levels = 13;
        header.validate().unwrap();

        header.mip_levels = 14;
        assert!(matches!(header.validate(), Err(Error::InvalidHeader(_))));

        // Unknown bits survive a read.
        header.attributes = 1 << 30 | TextureAttribute::TYPE_2D.bits();
        assert_eq!(header.attributes().bits(), 1 << 30 | 1 << 23);
    }
}
