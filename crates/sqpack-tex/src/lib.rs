//! Texture support for SqPack.
//!
//! Stored textures carry a fixed 0x50-byte [`TextureHeader`] in front of the
//! block-compressed pixel data. This crate describes that header, the LOD
//! block table found in the file header, and the engine's texture format
//! codes. Pixel data is never decoded; [`to_dds`] only wraps a decoded
//! payload in a DDS container so external tools can open it.
//!
//! # Example
//!
//! ```no_run
//! use sqpack_tex::{to_dds, TextureHeader};
//!
//! # let payload: Vec<u8> = Vec::new();
//! let header = TextureHeader::read(&payload)?;
//! println!("{}x{} {:?}", header.width(), header.height(), header.format());
//! let dds = to_dds(&header, &payload[TextureHeader::SIZE..])?;
//! std::fs::write("out.dds", dds).ok();
//! # Ok::<(), sqpack_tex::Error>(())
//! ```

mod dds;
mod error;
mod format;
mod header;

pub use dds::{to_dds, DdsHeader, DdsHeaderDxt10, DdsPixelFormat, FourCC};
pub use error::{Error, Result};
pub use format::{mip_size, FormatKind, TextureFormat};
pub use header::{LodBlock, TextureAttribute, TextureHeader};

/// DDS file magic bytes ("DDS ").
pub const DDS_MAGIC: &[u8; 4] = b"DDS ";
