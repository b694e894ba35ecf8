//! Texture format codes.
//!
//! A format code packs four nibbles: `kind << 12 | components << 8 |
//! bits << 4 | variant`. `bits` is a size class, not a bit count.

/// Family of a texture format, the top nibble of its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Integer,
    Float,
    Dxt,
    DepthStencil,
    Special,
    Bc,
    FloatUnorm,
}

impl FormatKind {
    pub fn from_nibble(value: u32) -> Option<Self> {
        match value {
            0x1 => Some(Self::Integer),
            0x2 => Some(Self::Float),
            0x3 => Some(Self::Dxt),
            0x4 => Some(Self::DepthStencil),
            0x5 => Some(Self::Special),
            0x6 => Some(Self::Bc),
            0x7 => Some(Self::FloatUnorm),
            _ => None,
        }
    }
}

const fn code(kind: u32, components: u32, bits: u32, variant: u32) -> u32 {
    (kind << 12) | (components << 8) | (bits << 4) | variant
}

/// Known texture formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TextureFormat {
    Null = code(0x5, 1, 0, 0),

    R8G8B8A8Unorm = code(0x1, 4, 5, 0),
    R8G8B8X8Unorm = code(0x1, 4, 5, 1),
    R4G4B4A4Unorm = code(0x1, 4, 4, 0),
    R5G5B5A1Unorm = code(0x1, 4, 4, 1),

    L8Unorm = code(0x1, 1, 3, 0),
    A8Unorm = code(0x1, 1, 3, 1),
    R8Unorm = code(0x1, 1, 3, 2),
    R8Int = code(0x1, 1, 3, 3),

    R16Int = code(0x1, 1, 4, 0),
    R16Float = code(0x2, 1, 4, 0),
    R16Unorm = code(0x7, 1, 4, 0),

    R32Int = code(0x1, 1, 5, 0),
    R32Float = code(0x2, 1, 5, 0),
    R32G32Float = code(0x2, 2, 6, 0),
    R32G32B32A32Float = code(0x2, 4, 7, 0),

    R8G8Unorm = code(0x1, 2, 4, 0),

    R16G16Float = code(0x2, 2, 5, 0),
    R16G16Unorm = code(0x7, 2, 5, 0),
    R16G16B16A16Float = code(0x2, 4, 6, 0),

    Dxt1 = code(0x3, 4, 2, 0),
    Dxt3 = code(0x3, 4, 3, 0),
    Dxt5 = code(0x3, 4, 3, 1),

    Bc5 = code(0x6, 2, 3, 0),
    Bc7 = code(0x6, 4, 3, 2),

    D16 = code(0x4, 1, 4, 0),
    D24S8 = code(0x4, 2, 5, 0),
    Shadow16 = code(0x5, 1, 4, 0),
    Shadow24 = code(0x5, 1, 5, 0),
}

impl TextureFormat {
    pub const ALL: [Self; 29] = [
        Self::Null,
        Self::R8G8B8A8Unorm,
        Self::R8G8B8X8Unorm,
        Self::R4G4B4A4Unorm,
        Self::R5G5B5A1Unorm,
        Self::L8Unorm,
        Self::A8Unorm,
        Self::R8Unorm,
        Self::R8Int,
        Self::R16Int,
        Self::R16Float,
        Self::R16Unorm,
        Self::R32Int,
        Self::R32Float,
        Self::R32G32Float,
        Self::R32G32B32A32Float,
        Self::R8G8Unorm,
        Self::R16G16Float,
        Self::R16G16Unorm,
        Self::R16G16B16A16Float,
        Self::Dxt1,
        Self::Dxt3,
        Self::Dxt5,
        Self::Bc5,
        Self::Bc7,
        Self::D16,
        Self::D24S8,
        Self::Shadow16,
        Self::Shadow24,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn kind(self) -> FormatKind {
        // Every variant's code starts with a valid nibble.
        FormatKind::from_nibble(self.code() >> 12).unwrap_or(FormatKind::Special)
    }

    /// Number of channels.
    #[inline]
    pub const fn components(self) -> u32 {
        (self.code() >> 8) & 0xF
    }

    /// Whether pixels are stored as 4x4 compressed blocks.
    pub fn is_block_compressed(self) -> bool {
        matches!(self.kind(), FormatKind::Dxt | FormatKind::Bc)
    }

    /// Bytes per 4x4 block for block-compressed formats.
    pub fn block_bytes(self) -> Option<usize> {
        match self {
            Self::Dxt1 => Some(8),
            Self::Dxt3 | Self::Dxt5 | Self::Bc5 | Self::Bc7 => Some(16),
            _ => None,
        }
    }

    /// Bits per pixel.
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Null => 0,
            Self::Dxt1 => 4,
            Self::Dxt3 | Self::Dxt5 | Self::Bc5 | Self::Bc7 => 8,
            Self::L8Unorm | Self::A8Unorm | Self::R8Unorm | Self::R8Int => 8,
            Self::R4G4B4A4Unorm
            | Self::R5G5B5A1Unorm
            | Self::R16Int
            | Self::R16Float
            | Self::R16Unorm
            | Self::R8G8Unorm
            | Self::D16
            | Self::Shadow16 => 16,
            Self::Shadow24 => 24,
            Self::R8G8B8A8Unorm
            | Self::R8G8B8X8Unorm
            | Self::R32Int
            | Self::R32Float
            | Self::R16G16Float
            | Self::R16G16Unorm
            | Self::D24S8 => 32,
            Self::R32G32Float | Self::R16G16B16A16Float => 64,
            Self::R32G32B32A32Float => 128,
        }
    }
}

/// Size in bytes of one mip level of a single surface.
///
/// Block-compressed formats round each dimension up to whole 4x4 blocks.
pub fn mip_size(format: TextureFormat, width: u32, height: u32, depth: u32, level: u32) -> usize {
    let w = (width >> level).max(1) as usize;
    let h = (height >> level).max(1) as usize;
    let d = (depth >> level).max(1) as usize;

    match format.block_bytes() {
        Some(block) => w.div_ceil(4) * h.div_ceil(4) * block * d,
        None => (w * h * d * format.bits_per_pixel() as usize).div_ceil(8),
    }
}
