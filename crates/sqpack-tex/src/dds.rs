//! DDS container export.

use tracing::warn;
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

use crate::format::TextureFormat;
use crate::header::TextureHeader;
use crate::{Error, Result, DDS_MAGIC};

/// DDS file header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsHeader {
    /// Header size (should be 124).
    pub size: u32,
    pub flags: u32,
    pub height: u32,
    pub width: u32,
    pub pitch_or_linear_size: u32,
    pub depth: u32,
    pub mipmap_count: u32,
    pub reserved1: [u32; 11],
    pub pixel_format: DdsPixelFormat,
    pub caps: u32,
    pub caps2: u32,
    pub caps3: u32,
    pub caps4: u32,
    pub reserved2: u32,
}

impl DdsHeader {
    pub const SIZE: u32 = 124;

    const CAPS: u32 = 0x1;
    const HEIGHT: u32 = 0x2;
    const WIDTH: u32 = 0x4;
    const PITCH: u32 = 0x8;
    const PIXEL_FORMAT: u32 = 0x1000;
    const MIPMAP_COUNT: u32 = 0x2_0000;
    const LINEAR_SIZE: u32 = 0x8_0000;
    const DEPTH: u32 = 0x80_0000;

    const CAPS_COMPLEX: u32 = 0x8;
    const CAPS_TEXTURE: u32 = 0x1000;
    const CAPS_MIPMAP: u32 = 0x40_0000;

    const CAPS2_CUBEMAP_ALL_FACES: u32 = 0xFE00;
    const CAPS2_VOLUME: u32 = 0x20_0000;

    /// Check if this is a DX10 extended header.
    pub fn is_dx10(&self) -> bool {
        self.pixel_format.four_cc == FourCC::DX10
    }
}

/// DDS pixel format.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsPixelFormat {
    /// Structure size (should be 32).
    pub size: u32,
    pub flags: u32,
    pub four_cc: FourCC,
    pub rgb_bit_count: u32,
    pub r_bit_mask: u32,
    pub g_bit_mask: u32,
    pub b_bit_mask: u32,
    pub a_bit_mask: u32,
}

impl DdsPixelFormat {
    pub const SIZE: u32 = 32;

    const ALPHA_PIXELS: u32 = 0x1;
    const ALPHA: u32 = 0x2;
    const FOUR_CC: u32 = 0x4;
    const RGB: u32 = 0x40;
    const LUMINANCE: u32 = 0x2_0000;

    fn four_cc(code: FourCC) -> Self {
        let mut format = Self::new_zeroed();
        format.size = Self::SIZE;
        format.flags = Self::FOUR_CC;
        format.four_cc = code;
        format
    }

    fn masks(flags: u32, bits: u32, r: u32, g: u32, b: u32, a: u32) -> Self {
        Self {
            size: Self::SIZE,
            flags,
            four_cc: FourCC([0; 4]),
            rgb_bit_count: bits,
            r_bit_mask: r,
            g_bit_mask: g,
            b_bit_mask: b,
            a_bit_mask: a,
        }
    }
}

/// Four-character code for compression type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(transparent)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub const DXT1: Self = Self(*b"DXT1");
    pub const DXT3: Self = Self(*b"DXT3");
    pub const DXT5: Self = Self(*b"DXT5");
    /// DX10 extended header follows.
    pub const DX10: Self = Self(*b"DX10");
}

/// DX10 extended header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct DdsHeaderDxt10 {
    pub dxgi_format: u32,
    pub resource_dimension: u32,
    pub misc_flag: u32,
    pub array_size: u32,
    pub misc_flags2: u32,
}

impl DdsHeaderDxt10 {
    const DIMENSION_TEXTURE2D: u32 = 3;
    const DIMENSION_TEXTURE3D: u32 = 4;
    const MISC_TEXTURECUBE: u32 = 0x4;
}

/// How a format is described in a DDS file.
enum DdsFormat {
    Legacy(DdsPixelFormat),
    Dxgi(u32),
}

fn dds_format(format: TextureFormat) -> Option<DdsFormat> {
    use DdsFormat::{Dxgi, Legacy};
    use TextureFormat as F;

    let rgb = DdsPixelFormat::RGB;
    let rgba = DdsPixelFormat::RGB | DdsPixelFormat::ALPHA_PIXELS;
    let format = match format {
        F::Dxt1 => Legacy(DdsPixelFormat::four_cc(FourCC::DXT1)),
        F::Dxt3 => Legacy(DdsPixelFormat::four_cc(FourCC::DXT3)),
        F::Dxt5 => Legacy(DdsPixelFormat::four_cc(FourCC::DXT5)),
        // Stored as B8G8R8A8 in memory.
        F::R8G8B8A8Unorm => Legacy(DdsPixelFormat::masks(
            rgba, 32, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000,
        )),
        F::R8G8B8X8Unorm => Legacy(DdsPixelFormat::masks(
            rgb, 32, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0,
        )),
        F::R4G4B4A4Unorm => Legacy(DdsPixelFormat::masks(rgba, 16, 0x0F00, 0x00F0, 0x000F, 0xF000)),
        F::R5G5B5A1Unorm => Legacy(DdsPixelFormat::masks(rgba, 16, 0x7C00, 0x03E0, 0x001F, 0x8000)),
        F::L8Unorm => Legacy(DdsPixelFormat::masks(DdsPixelFormat::LUMINANCE, 8, 0xFF, 0, 0, 0)),
        F::A8Unorm => Legacy(DdsPixelFormat::masks(DdsPixelFormat::ALPHA, 8, 0, 0, 0, 0xFF)),
        F::R8Unorm => Dxgi(61),
        F::R8Int => Dxgi(62),
        F::R16Int => Dxgi(57),
        F::R16Float => Dxgi(54),
        F::R16Unorm => Dxgi(56),
        F::R32Int => Dxgi(42),
        F::R32Float => Dxgi(41),
        F::R32G32Float => Dxgi(16),
        F::R32G32B32A32Float => Dxgi(2),
        F::R8G8Unorm => Dxgi(49),
        F::R16G16Float => Dxgi(34),
        F::R16G16Unorm => Dxgi(35),
        F::R16G16B16A16Float => Dxgi(10),
        F::Bc5 => Dxgi(83),
        F::Bc7 => Dxgi(98),
        F::D16 => Dxgi(55),
        F::D24S8 => Dxgi(45),
        F::Null | F::Shadow16 | F::Shadow24 => return None,
    };
    Some(format)
}

/// Wrap a decoded texture payload in a DDS container.
///
/// `pixels` is the block-decoded data following the texture header. Pixel
/// data is copied unchanged; nothing is transcoded.
pub fn to_dds(header: &TextureHeader, pixels: &[u8]) -> Result<Vec<u8>> {
    header.validate()?;
    let format = header.format()?;
    let Some(dds_format) = dds_format(format) else {
        warn!("Texture format {format:?} has no DDS equivalent");
        return Err(Error::UnknownFormat(format.code()));
    };

    let attributes = header.attributes();
    let (width, height, depth) = (header.width(), header.height(), header.depth());
    let mips = header.mip_levels();

    let mut dds = DdsHeader::new_zeroed();
    dds.size = DdsHeader::SIZE;
    dds.flags = DdsHeader::CAPS | DdsHeader::HEIGHT | DdsHeader::WIDTH | DdsHeader::PIXEL_FORMAT;
    dds.width = width;
    dds.height = height;
    dds.caps = DdsHeader::CAPS_TEXTURE;

    if format.is_block_compressed() {
        dds.flags |= DdsHeader::LINEAR_SIZE;
        dds.pitch_or_linear_size = crate::mip_size(format, width, height, 1, 0) as u32;
    } else {
        dds.flags |= DdsHeader::PITCH;
        dds.pitch_or_linear_size = (width * format.bits_per_pixel()).div_ceil(8);
    }
    if mips > 1 {
        dds.flags |= DdsHeader::MIPMAP_COUNT;
        dds.mipmap_count = mips;
        dds.caps |= DdsHeader::CAPS_COMPLEX | DdsHeader::CAPS_MIPMAP;
    }
    if attributes.is_volume() && depth > 1 {
        dds.flags |= DdsHeader::DEPTH;
        dds.depth = depth;
        dds.caps |= DdsHeader::CAPS_COMPLEX;
        dds.caps2 |= DdsHeader::CAPS2_VOLUME;
    }
    if attributes.is_cube() {
        dds.caps |= DdsHeader::CAPS_COMPLEX;
        dds.caps2 |= DdsHeader::CAPS2_CUBEMAP_ALL_FACES;
    }

    let extended = match dds_format {
        DdsFormat::Legacy(pixel_format) => {
            dds.pixel_format = pixel_format;
            None
        }
        DdsFormat::Dxgi(dxgi_format) => {
            dds.pixel_format = DdsPixelFormat::four_cc(FourCC::DX10);
            Some(DdsHeaderDxt10 {
                dxgi_format,
                resource_dimension: if attributes.is_volume() {
                    DdsHeaderDxt10::DIMENSION_TEXTURE3D
                } else {
                    DdsHeaderDxt10::DIMENSION_TEXTURE2D
                },
                misc_flag: if attributes.is_cube() {
                    DdsHeaderDxt10::MISC_TEXTURECUBE
                } else {
                    0
                },
                array_size: header.array_size(),
                misc_flags2: 0,
            })
        }
    };

    let mut out = Vec::with_capacity(4 + DdsHeader::SIZE as usize + 20 + pixels.len());
    out.extend_from_slice(DDS_MAGIC);
    out.extend_from_slice(dds.as_bytes());
    if let Some(extended) = extended {
        out.extend_from_slice(extended.as_bytes());
    }
    out.extend_from_slice(pixels);
    Ok(out)
}
