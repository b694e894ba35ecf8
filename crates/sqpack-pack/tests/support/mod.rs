//! Builders for synthetic archives.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use sqpack_common::hash::{full_path_hash, hash_str, split_path};
use sqpack_common::ArchiveIdentity;

pub const RAW_THRESHOLD: usize = 0x7D00;

pub fn location(is_synonym: bool, container: u8, block_offset: u32) -> u32 {
    u32::from(is_synonym) | (u32::from(container) << 1) | (block_offset << 4)
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn pad_to(out: &mut Vec<u8>, start: usize, footprint: usize) {
    let span = (16 + footprint).div_ceil(128) * 128;
    assert!(out.len() <= start + span, "block data overruns its span");
    out.resize(start + span, 0);
}

/// A DEFLATE block, padded.
pub fn compressed_block(data: &[u8]) -> Vec<u8> {
    let packed = deflate(data);
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(16).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(packed.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    out.extend_from_slice(&packed);
    pad_to(&mut out, 0, data.len());
    out
}

/// A stored block. Stored blocks copy `compressed_size` bytes, which must be
/// at least the compression threshold.
pub fn raw_block(data: &[u8]) -> Vec<u8> {
    assert!(data.len() >= RAW_THRESHOLD);
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(16).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    out.extend_from_slice(data);
    pad_to(&mut out, 0, data.len());
    out
}

fn common_header(out: &mut [u8], file_type: u32, header_size: u32, file_size: u32, blocks: u32) {
    LittleEndian::write_u32(&mut out[0x00..], header_size);
    LittleEndian::write_u32(&mut out[0x04..], file_type);
    LittleEndian::write_u32(&mut out[0x08..], file_size);
    LittleEndian::write_u32(&mut out[0x0C..], blocks);
    LittleEndian::write_u32(&mut out[0x10..], blocks);
}

/// A generic file split into `chunk`-sized compressed blocks.
///
/// With `with_table` the header lists every block; otherwise blocks are
/// found by walking them in order.
pub fn generic_file(payload: &[u8], chunk: usize, with_table: bool) -> Vec<u8> {
    let blocks: Vec<Vec<u8>> = payload.chunks(chunk).map(compressed_block).collect();
    generic_file_from_blocks(&blocks, payload.len(), with_table)
}

pub fn generic_file_from_blocks(blocks: &[Vec<u8>], file_size: usize, with_table: bool) -> Vec<u8> {
    const HEADER: usize = 0x80;
    let mut header = vec![0u8; HEADER];
    common_header(&mut header, 1, HEADER as u32, file_size as u32, blocks.len() as u32);

    if with_table {
        LittleEndian::write_u32(&mut header[0x14..], blocks.len() as u32);
        let mut offset = 0usize;
        for (i, block) in blocks.iter().enumerate() {
            let at = 0x18 + i * 8;
            LittleEndian::write_u32(&mut header[at..], offset as u32);
            LittleEndian::write_u16(&mut header[at + 4..], block.len().min(0xFFFF) as u16);
            LittleEndian::write_u16(&mut header[at + 6..], 0);
            offset += block.len();
        }
    }

    let mut out = header;
    for block in blocks {
        out.extend_from_slice(block);
    }
    out
}

/// A model file with a stack region, a runtime region and LOD 0 vertex and
/// index buffers. Each region is a list of block payloads.
pub fn model_file(stack: &[&[u8]], runtime: &[&[u8]], vertex: &[&[u8]], index: &[&[u8]]) -> Vec<u8> {
    const HEADER: usize = 0x100;
    let mut header = vec![0u8; HEADER];
    let mut data = Vec::new();
    let mut lengths: Vec<u16> = Vec::new();

    // (offset field, block index field, block count field)
    let regions: [(&[&[u8]], usize, usize, usize); 4] = [
        (stack, 0x70, 0x9C, 0xB2),
        (runtime, 0x74, 0x9E, 0xB4),
        (vertex, 0x78, 0xA0, 0xB6),
        (index, 0x90, 0xAC, 0xC2),
    ];
    for (blocks, offset_at, index_at, count_at) in regions {
        LittleEndian::write_u32(&mut header[offset_at..], data.len() as u32);
        LittleEndian::write_u16(&mut header[index_at..], lengths.len() as u16);
        LittleEndian::write_u16(&mut header[count_at..], blocks.len() as u16);
        for payload in blocks {
            let block = compressed_block(payload);
            lengths.push(block.len() as u16);
            data.extend_from_slice(&block);
        }
    }

    let total: usize = [stack, runtime, vertex, index]
        .iter()
        .flat_map(|r| r.iter())
        .map(|b| b.len())
        .sum();
    common_header(&mut header, 2, HEADER as u32, total as u32, lengths.len() as u32);
    header[0xCC] = 1;
    for (i, len) in lengths.iter().enumerate() {
        LittleEndian::write_u16(&mut header[0xD0 + i * 2..], *len);
    }

    header.extend_from_slice(&data);
    header
}

/// A texture file: `texture_header` (0x50 bytes) then one block per mip.
pub fn texture_file(texture_header: &[u8], mips: &[&[u8]]) -> Vec<u8> {
    const HEADER: usize = 0x80;
    assert_eq!(texture_header.len(), 0x50);
    let blocks: Vec<Vec<u8>> = mips.iter().map(|m| compressed_block(m)).collect();

    let mut header = vec![0u8; HEADER];
    let total: usize = mips.iter().map(|m| m.len()).sum();
    common_header(&mut header, 3, HEADER as u32, total as u32, blocks.len() as u32);
    LittleEndian::write_u32(&mut header[0x14..], 1);

    // One LOD covering every block.
    let compressed: usize = blocks.iter().map(Vec::len).sum();
    LittleEndian::write_u32(&mut header[0x18..], 0x50);
    LittleEndian::write_u32(&mut header[0x1C..], compressed as u32);
    LittleEndian::write_u32(&mut header[0x20..], total as u32);
    LittleEndian::write_u32(&mut header[0x24..], 0);
    LittleEndian::write_u32(&mut header[0x28..], blocks.len() as u32);
    for (i, block) in blocks.iter().enumerate() {
        LittleEndian::write_u16(&mut header[0x2C + i * 2..], block.len() as u16);
    }

    let mut out = header;
    out.extend_from_slice(texture_header);
    for block in &blocks {
        out.extend_from_slice(block);
    }
    out
}

/// A texture header for a `width` x `height` image.
pub fn texture_header(format: u32, width: u16, height: u16, mips: u8) -> Vec<u8> {
    let mut out = vec![0u8; 0x50];
    LittleEndian::write_u32(&mut out[0x00..], 1 << 23);
    LittleEndian::write_u32(&mut out[0x04..], format);
    LittleEndian::write_u16(&mut out[0x08..], width);
    LittleEndian::write_u16(&mut out[0x0A..], height);
    LittleEndian::write_u16(&mut out[0x0C..], 1);
    out[0x0E] = mips;
    out[0x0F] = 1;
    out
}

/// Contents of one data container.
#[derive(Default)]
pub struct Dat {
    pub bytes: Vec<u8>,
}

impl Dat {
    /// Append a stored file at the next 128-byte boundary, returning its
    /// block offset.
    pub fn push(&mut self, stored: &[u8]) -> u32 {
        let start = self.bytes.len().div_ceil(128) * 128;
        self.place(start as u32 / 128, stored);
        start as u32 / 128
    }

    /// Put a stored file at `block_offset`.
    pub fn place(&mut self, block_offset: u32, stored: &[u8]) {
        let start = block_offset as usize * 128;
        assert!(self.bytes.len() <= start, "overlapping files");
        self.bytes.resize(start, 0);
        self.bytes.extend_from_slice(stored);
    }
}

/// Builder for `.index` and `.index2` files.
#[derive(Default)]
pub struct IndexBuilder {
    files: Vec<(String, u32)>,
    synonyms: Vec<(String, String, u32, u32)>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, container: u8, block_offset: u32) -> Self {
        self.files.push((path.to_string(), location(false, container, block_offset)));
        self
    }

    /// A hash-table entry flagged as colliding, whose own location is junk.
    pub fn colliding(mut self, path: &str) -> Self {
        self.files.push((path.to_string(), location(true, 7, 0x0FFF_FFFF)));
        self
    }

    /// A synonym record keyed by `key_path`'s hashes naming `literal`.
    pub fn synonym(
        mut self,
        key_path: &str,
        literal: &str,
        container: u8,
        block_offset: u32,
        synonym_index: u32,
    ) -> Self {
        self.synonyms.push((
            key_path.to_string(),
            literal.to_string(),
            location(false, container, block_offset),
            synonym_index,
        ));
        self
    }

    /// `.index` layout: 16-byte records grouped by directory.
    pub fn build_wide(&self) -> Vec<u8> {
        let mut dirs: BTreeMap<u32, Vec<(u32, u32)>> = BTreeMap::new();
        for (path, location) in &self.files {
            let (dir, file) = split_path(path);
            dirs.entry(hash_str(dir)).or_default().push((hash_str(file), *location));
        }

        let mut hash_table = Vec::new();
        let mut dir_table = Vec::new();
        for (dir_hash, files) in &dirs {
            let offset = 0x800 + hash_table.len();
            for (file_hash, location) in files {
                let key = (u64::from(*dir_hash) << 32) | u64::from(*file_hash);
                hash_table.write_u64::<LittleEndian>(key).unwrap();
                hash_table.write_u32::<LittleEndian>(*location).unwrap();
                hash_table.write_u32::<LittleEndian>(0).unwrap();
            }
            dir_table.write_u32::<LittleEndian>(*dir_hash).unwrap();
            dir_table.write_u32::<LittleEndian>(offset as u32).unwrap();
            dir_table.write_u32::<LittleEndian>((files.len() * 16) as u32).unwrap();
            dir_table.write_u32::<LittleEndian>(0).unwrap();
        }

        let mut synonyms = Vec::new();
        for (key_path, literal, location, index) in &self.synonyms {
            let (dir, file) = split_path(key_path);
            let key = (u64::from(hash_str(dir)) << 32) | u64::from(hash_str(file));
            synonyms.write_u64::<LittleEndian>(key).unwrap();
            synonyms.write_u32::<LittleEndian>(*location).unwrap();
            synonyms.write_u32::<LittleEndian>(*index).unwrap();
            synonyms.extend_from_slice(&path_field(literal));
        }

        assemble(0, &hash_table, &dir_table, &synonyms)
    }

    /// `.index2` layout: 8-byte records keyed by full-path hash, no directories.
    pub fn build_flat(&self) -> Vec<u8> {
        let mut hash_table = Vec::new();
        for (path, location) in &self.files {
            hash_table.write_u32::<LittleEndian>(full_path_hash(path)).unwrap();
            hash_table.write_u32::<LittleEndian>(*location).unwrap();
        }

        let mut synonyms = Vec::new();
        for (key_path, literal, location, index) in &self.synonyms {
            synonyms.write_u32::<LittleEndian>(full_path_hash(key_path)).unwrap();
            synonyms.write_u32::<LittleEndian>(0).unwrap();
            synonyms.write_u32::<LittleEndian>(*location).unwrap();
            synonyms.write_u32::<LittleEndian>(*index).unwrap();
            synonyms.extend_from_slice(&path_field(literal));
        }

        assemble(2, &hash_table, &[], &synonyms)
    }
}

fn path_field(path: &str) -> [u8; 240] {
    let mut field = [0u8; 240];
    field[..path.len()].copy_from_slice(path.as_bytes());
    field
}

fn assemble(index_type: u32, hash_table: &[u8], dir_table: &[u8], synonyms: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; 0x800];
    out[..8].copy_from_slice(b"SqPack\0\0");
    LittleEndian::write_u32(&mut out[0x0C..], 0x400);
    LittleEndian::write_u32(&mut out[0x10..], 1);
    LittleEndian::write_u32(&mut out[0x14..], 2);

    let info = &mut out[0x400..];
    let hash_offset = 0x800;
    let dir_offset = hash_offset + hash_table.len();
    let synonym_offset = dir_offset + dir_table.len();
    LittleEndian::write_u32(&mut info[0x00..], 0x400);
    LittleEndian::write_u32(&mut info[0x04..], 1);
    LittleEndian::write_u32(&mut info[0x08..], hash_offset as u32);
    LittleEndian::write_u32(&mut info[0x0C..], hash_table.len() as u32);
    LittleEndian::write_u32(&mut info[0x50..], 2);
    LittleEndian::write_u32(&mut info[0x54..], synonym_offset as u32);
    LittleEndian::write_u32(&mut info[0x58..], synonyms.len() as u32);
    LittleEndian::write_u32(&mut info[0xE4..], dir_offset as u32);
    LittleEndian::write_u32(&mut info[0xE8..], dir_table.len() as u32);
    LittleEndian::write_u32(&mut info[0x12C..], index_type);

    out.extend_from_slice(hash_table);
    out.extend_from_slice(dir_table);
    out.extend_from_slice(synonyms);
    out
}

/// Write an archive's files under `root`.
pub fn write_archive(
    root: &Path,
    identity: ArchiveIdentity,
    index: Option<&[u8]>,
    index2: Option<&[u8]>,
    dats: &[&Dat],
) {
    let dir = root.join(identity.expansion_dir());
    fs::create_dir_all(&dir).unwrap();
    if let Some(index) = index {
        fs::write(identity.index_path(root), index).unwrap();
    }
    if let Some(index2) = index2 {
        fs::write(identity.index2_path(root), index2).unwrap();
    }
    for (id, dat) in dats.iter().enumerate() {
        fs::write(identity.dat_path(root, id as u8), &dat.bytes).unwrap();
    }
}

/// Compressible test payload.
pub fn payload(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| ((i / 7) as u8).wrapping_add(seed)).collect()
}
