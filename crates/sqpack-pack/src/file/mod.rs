//! Typed stored files.
//!
//! Every stored file starts with a [`FileHeader`] whose type tag selects how
//! the rest of the header is laid out and how the payload blocks are found:
//!
//! - generic: an optional table of [`BlockInfo`] records, else consecutive
//!   blocks
//! - model: per-region block runs described by a [`ModelHeader`]
//! - texture: a [`TextureHeader`] followed by blocks whose lengths come from
//!   the header's block-length table

pub mod header;
pub mod model;

use std::sync::{Arc, OnceLock};

use byteorder::{ByteOrder, LittleEndian};
use sqpack_common::BinaryReader;
use sqpack_index::FileEntry;
use sqpack_tex::{LodBlock, TextureHeader};

use crate::block::{self, ByteSource};
use crate::container::{ContainerSource, Containers};
use crate::{Error, Result};

pub use header::{BlockInfo, FileHeader, FileType, ModelHeader};
pub use model::{ModelLayout, ModelRegion};

/// Type-specific header of a stored file.
#[derive(Debug, Clone)]
pub enum TypedHeader {
    Generic {
        header: FileHeader,
        /// Empty when the file is a plain run of blocks.
        blocks: Vec<BlockInfo>,
    },
    Model {
        header: ModelHeader,
        block_lengths: Vec<u16>,
    },
    Texture {
        header: FileHeader,
        lods: Vec<LodBlock>,
        block_lengths: Vec<u16>,
        texture: TextureHeader,
    },
}

impl TypedHeader {
    pub fn kind(&self) -> FileType {
        match self {
            Self::Generic { .. } => FileType::Generic,
            Self::Model { .. } => FileType::Model,
            Self::Texture { .. } => FileType::Texture,
        }
    }

    /// Common header prefix.
    pub fn common(&self) -> &FileHeader {
        match self {
            Self::Generic { header, .. } | Self::Texture { header, .. } => header,
            Self::Model { header, .. } => &header.common,
        }
    }

    /// Texture header, for texture files.
    pub fn texture(&self) -> Option<&TextureHeader> {
        match self {
            Self::Texture { texture, .. } => Some(texture),
            _ => None,
        }
    }

    /// Model header, for model files.
    pub fn model(&self) -> Option<&ModelHeader> {
        match self {
            Self::Model { header, .. } => Some(header),
            _ => None,
        }
    }

    /// Parse the type-specific part of a header.
    ///
    /// `bytes` is the whole stored header, `header_size` bytes long. Texture
    /// headers also need the [`TextureHeader`] stored at the data start.
    fn parse<F>(header: FileHeader, bytes: &[u8], read_texture: F) -> Result<Self>
    where
        F: FnOnce() -> Result<TextureHeader>,
    {
        match header.kind()? {
            FileType::Generic => {
                let blocks = if bytes.len() >= header::generic::BLOCK_INFO_TABLE {
                    let count = LittleEndian::read_u32(&bytes[header::generic::BLOCK_INFO_COUNT..]);
                    let table = &bytes[header::generic::BLOCK_INFO_TABLE..];
                    if count as usize > table.len() / BlockInfo::SIZE {
                        return Err(Error::CorruptBlock(format!(
                            "{count} block infos do not fit a {} byte header",
                            bytes.len()
                        )));
                    }
                    BinaryReader::new(table).read_structs(count as usize)?
                } else {
                    Vec::new()
                };
                Ok(Self::Generic { header, blocks })
            }
            FileType::Model => {
                if bytes.len() < ModelHeader::MIN_HEADER_SIZE {
                    return Err(Error::CorruptBlock(format!(
                        "model header is {} bytes, need {:#x}",
                        bytes.len(),
                        ModelHeader::MIN_HEADER_SIZE
                    )));
                }
                let model: ModelHeader = BinaryReader::new(bytes).read_struct()?;
                let block_lengths = u16_table(&bytes[ModelHeader::SIZE..]);
                Ok(Self::Model {
                    header: model,
                    block_lengths,
                })
            }
            FileType::Texture => {
                if bytes.len() < header::texture::LOD_TABLE {
                    return Err(Error::CorruptBlock(format!(
                        "texture header is {} bytes",
                        bytes.len()
                    )));
                }
                let lod_count = LittleEndian::read_u32(&bytes[header::texture::LOD_COUNT..]);
                let lod_table = &bytes[header::texture::LOD_TABLE..];
                if lod_count as usize > lod_table.len() / LodBlock::SIZE {
                    return Err(Error::CorruptBlock(format!(
                        "{lod_count} LOD blocks do not fit a {} byte header",
                        bytes.len()
                    )));
                }
                let lods: Vec<LodBlock> = BinaryReader::new(lod_table).read_structs(lod_count as usize)?;
                let block_lengths = u16_table(&lod_table[lods.len() * LodBlock::SIZE..]);
                Ok(Self::Texture {
                    header,
                    lods,
                    block_lengths,
                    texture: read_texture()?,
                })
            }
        }
    }
}

fn u16_table(bytes: &[u8]) -> Vec<u16> {
    let mut table = vec![0u16; bytes.len() / 2];
    LittleEndian::read_u16_into(&bytes[..table.len() * 2], &mut table);
    table
}

/// A decoded file: its typed header and payload.
#[derive(Debug, Clone)]
pub struct TypedFile {
    pub header: TypedHeader,
    pub payload: Vec<u8>,
    /// Region ranges inside `payload`, for models.
    pub layout: Option<ModelLayout>,
}

impl TypedFile {
    #[inline]
    pub fn kind(&self) -> FileType {
        self.header.kind()
    }

    /// Wrap a texture payload in a DDS container.
    pub fn to_dds(&self) -> Result<Vec<u8>> {
        let texture = self
            .header
            .texture()
            .ok_or(Error::UnsupportedFileType(self.kind().tag()))?;
        Ok(sqpack_tex::to_dds(texture, &self.payload)?)
    }
}

#[derive(Debug)]
struct Decoded {
    payload: Vec<u8>,
    layout: Option<ModelLayout>,
}

/// A stored file opened from its index entry.
///
/// The header is read on open; the payload is decoded on first access and
/// kept for the life of the object.
pub struct SqFile<'a> {
    containers: &'a Containers,
    entry: Arc<FileEntry>,
    header: TypedHeader,
    decoded: OnceLock<Decoded>,
}

impl<'a> SqFile<'a> {
    pub(crate) fn open(containers: &'a Containers, entry: Arc<FileEntry>) -> Result<Self> {
        let source = containers.source(entry.container_id())?;
        let offset = entry.byte_offset();

        let prefix = source.read_exact_at(offset, FileHeader::SIZE)?;
        let common: FileHeader = BinaryReader::new(&prefix).read_struct()?;
        common.validate()?;

        let bytes = source.read_exact_at(offset, common.header_size as usize)?;
        let data_start = offset + u64::from(common.header_size);
        let header = TypedHeader::parse(common, &bytes, || {
            let raw = source.read_exact_at(data_start, TextureHeader::SIZE)?;
            Ok(TextureHeader::read(&raw)?)
        })?;

        Ok(Self {
            containers,
            entry,
            header,
            decoded: OnceLock::new(),
        })
    }

    pub fn entry(&self) -> &Arc<FileEntry> {
        &self.entry
    }

    pub fn header(&self) -> &TypedHeader {
        &self.header
    }

    #[inline]
    pub fn kind(&self) -> FileType {
        self.header.kind()
    }

    /// Absolute offset of the first byte after the stored header.
    pub fn data_start(&self) -> u64 {
        self.entry.byte_offset() + u64::from(self.header.common().header_size)
    }

    /// Decoded payload.
    pub fn payload(&self) -> Result<&[u8]> {
        Ok(&self.decoded()?.payload)
    }

    /// Region ranges of a model payload.
    pub fn model_layout(&self) -> Result<Option<&ModelLayout>> {
        Ok(self.decoded()?.layout.as_ref())
    }

    /// Consume the file, decoding the payload if not done yet.
    pub fn into_typed(self) -> Result<TypedFile> {
        self.decoded()?;
        let decoded = self.decoded.into_inner().ok_or_else(|| {
            Error::CorruptBlock("payload vanished after decoding".to_string())
        })?;
        Ok(TypedFile {
            header: self.header,
            payload: decoded.payload,
            layout: decoded.layout,
        })
    }

    fn decoded(&self) -> Result<&Decoded> {
        if let Some(decoded) = self.decoded.get() {
            return Ok(decoded);
        }
        let source = self.containers.source(self.entry.container_id())?;
        let decoded = self.decode(&source)?;
        Ok(self.decoded.get_or_init(move || decoded))
    }

    fn decode(&self, source: &ContainerSource<'_>) -> Result<Decoded> {
        let data_start = self.data_start();
        match &self.header {
            TypedHeader::Generic { header, blocks } => {
                let payload = if blocks.is_empty() {
                    block::decode_blocks_sequential(source, data_start, header.block_count as usize)?
                } else {
                    let mut out = Vec::new();
                    for info in blocks {
                        block::decode_block_at(source, data_start + u64::from(info.offset), &mut out)?;
                    }
                    out
                };
                Ok(Decoded {
                    payload,
                    layout: None,
                })
            }
            TypedHeader::Model {
                header,
                block_lengths,
            } => {
                let (payload, layout) = model::decode(source, data_start, header, block_lengths)?;
                Ok(Decoded {
                    payload,
                    layout: Some(layout),
                })
            }
            TypedHeader::Texture {
                header,
                block_lengths,
                ..
            } => {
                let used = block_lengths.iter().take_while(|&&len| len != 0).count();
                let declared = header.block_count as usize;
                if used > declared {
                    return Err(Error::CorruptBlock(format!(
                        "texture uses {used} blocks, header declares {declared}"
                    )));
                }
                let start = data_start + TextureHeader::SIZE as u64;
                let payload = block::decode_blocks_with_lengths(source, start, &block_lengths[..used])?;
                Ok(Decoded {
                    payload,
                    layout: None,
                })
            }
        }
    }
}

impl std::fmt::Debug for SqFile<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqFile")
            .field("entry", &self.entry)
            .field("kind", &self.kind())
            .field("decoded", &self.decoded.get().is_some())
            .finish()
    }
}
