//! Block codec.
//!
//! A stored payload is a run of blocks. Each block starts with a 16-byte
//! [`BlockHeader`] followed by either raw DEFLATE data or stored bytes, and
//! the whole block is padded to a multiple of 128 bytes.

use std::io::Read;

use flate2::read::DeflateDecoder;
use sqpack_common::{BinaryReader, BLOCK_ALIGNMENT};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// Blocks with a compressed size below this are DEFLATE streams.
pub const COMPRESSION_THRESHOLD: u32 = 0x7D00;

/// Header in front of every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct BlockHeader {
    /// Always 16.
    pub header_size: u32,
    pub version: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl BlockHeader {
    pub const SIZE: usize = 16;

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.compressed_size < COMPRESSION_THRESHOLD
    }

    /// Bytes the block occupies after its header, before padding.
    #[inline]
    pub fn footprint(&self) -> u32 {
        if self.is_compressed() {
            self.uncompressed_size
        } else {
            self.compressed_size
        }
    }

    /// Bytes from the start of this header to the start of the next block.
    #[inline]
    pub fn span(&self) -> u64 {
        padded_len(self.footprint())
    }
}

/// On-disk span of a block whose data occupies `footprint` bytes.
///
/// Measured from the start of the block header, rounded up to 128 bytes.
#[inline]
pub fn padded_len(footprint: u32) -> u64 {
    (BlockHeader::SIZE as u64 + u64::from(footprint)).next_multiple_of(BLOCK_ALIGNMENT)
}

/// Random-access byte source blocks are decoded from.
pub trait ByteSource {
    /// Read exactly `len` bytes at `offset`.
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Vec<u8>>;
}

impl ByteSource for [u8] {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX);
        start
            .checked_add(len)
            .and_then(|end| self.get(start..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                Error::CorruptBlock(format!(
                    "{len} bytes at {offset:#x} run past a buffer of {} bytes",
                    self.len()
                ))
            })
    }
}

impl ByteSource for Vec<u8> {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.as_slice().read_exact_at(offset, len)
    }
}

/// Read and check the block header at `offset`.
pub fn read_block_header<S: ByteSource + ?Sized>(source: &S, offset: u64) -> Result<BlockHeader> {
    let bytes = source.read_exact_at(offset, BlockHeader::SIZE)?;
    let header: BlockHeader = BinaryReader::new(&bytes).read_struct()?;
    let header_size = header.header_size;
    if header_size as usize != BlockHeader::SIZE {
        return Err(Error::CorruptBlock(format!(
            "block at {offset:#x} has header size {header_size}, expected {}",
            BlockHeader::SIZE
        )));
    }
    Ok(header)
}

/// Decode the block at `offset`, appending its data to `out`.
///
/// Returns the block's on-disk span.
pub fn decode_block_at<S: ByteSource + ?Sized>(
    source: &S,
    offset: u64,
    out: &mut Vec<u8>,
) -> Result<u64> {
    let header = read_block_header(source, offset)?;
    let data_offset = offset + BlockHeader::SIZE as u64;
    let compressed_size = header.compressed_size as usize;
    let data = source.read_exact_at(data_offset, compressed_size)?;

    if header.is_compressed() {
        inflate(&data, header.uncompressed_size as usize, out)?;
    } else {
        out.extend_from_slice(&data);
    }

    Ok(header.span())
}

/// Decode `count` consecutive blocks starting at `start`.
pub fn decode_blocks_sequential<S: ByteSource + ?Sized>(
    source: &S,
    start: u64,
    count: usize,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut offset = start;
    for _ in 0..count {
        offset += decode_block_at(source, offset, &mut out)?;
    }
    Ok(out)
}

/// Decode blocks starting at `start`, advancing by the stored `lengths`.
///
/// Lengths come from a file header's block table rather than from the
/// blocks themselves.
pub fn decode_blocks_with_lengths<S: ByteSource + ?Sized>(
    source: &S,
    start: u64,
    lengths: &[u16],
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut offset = start;
    for &length in lengths {
        decode_block_at(source, offset, &mut out)?;
        offset += u64::from(length);
    }
    Ok(out)
}

const MAX_DEFLATE_RATIO: usize = 1032;

/// Inflate a raw DEFLATE stream that must produce exactly `expected` bytes.
fn inflate(data: &[u8], expected: usize, out: &mut Vec<u8>) -> Result<()> {
    let start = out.len();
    // DEFLATE cannot expand input by more than this, whatever the header says.
    out.reserve(expected.min(data.len().saturating_mul(MAX_DEFLATE_RATIO)));

    // One byte of slack is enough to notice an overlong stream.
    let mut decoder = DeflateDecoder::new(data).take(expected as u64 + 1);
    decoder
        .read_to_end(out)
        .map_err(|e| Error::CorruptBlock(format!("inflate failed: {e}")))?;

    let actual = out.len() - start;
    if actual != expected {
        out.truncate(start);
        return Err(Error::DecompressionSizeMismatch { expected, actual });
    }
    Ok(())
}
