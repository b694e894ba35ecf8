//! Model file regions.

use std::fmt;
use std::ops::Range;

use crate::block::{self, ByteSource};
use crate::file::header::ModelHeader;
use crate::{Error, Result};

/// A buffer region of a model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRegion {
    StackMemory,
    RuntimeMemory,
    VertexBuffer(u8),
    EdgeGeometryVertexBuffer(u8),
    IndexBuffer(u8),
}

impl fmt::Display for ModelRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackMemory => f.write_str("stack"),
            Self::RuntimeMemory => f.write_str("runtime"),
            Self::VertexBuffer(lod) => write!(f, "vertex[{lod}]"),
            Self::EdgeGeometryVertexBuffer(lod) => write!(f, "edge_vertex[{lod}]"),
            Self::IndexBuffer(lod) => write!(f, "index[{lod}]"),
        }
    }
}

/// Where a region is stored and which block-length entries it uses.
#[derive(Debug, Clone, Copy)]
struct RegionSpec {
    region: ModelRegion,
    offset: u32,
    first_block: u16,
    block_count: u16,
}

/// Position of every region inside a decoded model payload.
///
/// Regions appear in storage order: stack, runtime, then vertex, edge
/// geometry and index buffers for each LOD in turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelLayout {
    regions: Vec<(ModelRegion, Range<usize>)>,
}

impl ModelLayout {
    /// Payload range of a region, if the model has it.
    pub fn get(&self, region: ModelRegion) -> Option<Range<usize>> {
        self.regions
            .iter()
            .find(|(r, _)| *r == region)
            .map(|(_, range)| range.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelRegion, Range<usize>)> + '_ {
        self.regions.iter().cloned()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn regions(header: &ModelHeader) -> Vec<RegionSpec> {
    let mut specs = vec![
        RegionSpec {
            region: ModelRegion::StackMemory,
            offset: header.stack_memory_offset,
            first_block: header.stack_block_index,
            block_count: header.stack_block_count,
        },
        RegionSpec {
            region: ModelRegion::RuntimeMemory,
            offset: header.runtime_memory_offset,
            first_block: header.runtime_block_index,
            block_count: header.runtime_block_count,
        },
    ];

    let (vb_offset, vb_index, vb_count) = (
        header.vertex_buffer_offset,
        header.vertex_buffer_block_index,
        header.vertex_buffer_block_count,
    );
    let (eg_offset, eg_index, eg_count) = (
        header.edge_geometry_vertex_buffer_offset,
        header.edge_geometry_vertex_buffer_block_index,
        header.edge_geometry_vertex_buffer_block_count,
    );
    let (ib_offset, ib_index, ib_count) = (
        header.index_buffer_offset,
        header.index_buffer_block_index,
        header.index_buffer_block_count,
    );

    for lod in 0..header.lods() {
        let tag = lod as u8;
        specs.push(RegionSpec {
            region: ModelRegion::VertexBuffer(tag),
            offset: vb_offset[lod],
            first_block: vb_index[lod],
            block_count: vb_count[lod],
        });
        specs.push(RegionSpec {
            region: ModelRegion::EdgeGeometryVertexBuffer(tag),
            offset: eg_offset[lod],
            first_block: eg_index[lod],
            block_count: eg_count[lod],
        });
        specs.push(RegionSpec {
            region: ModelRegion::IndexBuffer(tag),
            offset: ib_offset[lod],
            first_block: ib_index[lod],
            block_count: ib_count[lod],
        });
    }

    specs
}

/// Decode every region of a model and concatenate them.
pub(crate) fn decode<S: ByteSource + ?Sized>(
    source: &S,
    data_start: u64,
    header: &ModelHeader,
    lengths: &[u16],
) -> Result<(Vec<u8>, ModelLayout)> {
    let declared = header.common.block_count as usize;
    let mut consumed = 0usize;
    let mut payload = Vec::new();
    let mut layout = ModelLayout::default();

    for spec in regions(header) {
        let start = payload.len();
        if spec.block_count > 0 {
            let first = usize::from(spec.first_block);
            let end = first + usize::from(spec.block_count);
            let table = lengths.get(first..end).ok_or_else(|| {
                Error::CorruptBlock(format!(
                    "model region {} uses block entries {first}..{end} of {}",
                    spec.region,
                    lengths.len()
                ))
            })?;

            consumed += table.len();
            if consumed > declared {
                return Err(Error::CorruptBlock(format!(
                    "model regions use {consumed} blocks, header declares {declared}"
                )));
            }

            let data =
                block::decode_blocks_with_lengths(source, data_start + u64::from(spec.offset), table)?;
            payload.extend_from_slice(&data);
        }
        layout.regions.push((spec.region, start..payload.len()));
    }

    Ok((payload, layout))
}
