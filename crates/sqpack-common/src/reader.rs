//! Cursor over little-endian on-disk records.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// Reads fixed-layout records off a byte slice.
///
/// ```
/// use sqpack_common::BinaryReader;
///
/// let data = [0x80, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// let [size, kind]: [u32; 2] = reader.read_struct().unwrap();
/// assert_eq!((size, kind), (0x80, 2));
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the cursor.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Take the next `count` bytes.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read one record. Records are copied out, so packed layouts are fine.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Read `count` consecutive records.
    pub fn read_structs<T: FromBytes>(&mut self, count: usize) -> Result<Vec<T>> {
        let needed = count.saturating_mul(std::mem::size_of::<T>());
        if self.remaining() < needed {
            return Err(Error::UnexpectedEof {
                needed,
                available: self.remaining(),
            });
        }
        (0..count).map(|_| self.read_struct()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::{Immutable, KnownLayout};

    #[derive(FromBytes, Immutable, KnownLayout)]
    #[repr(C, packed)]
    struct Record {
        tag: u8,
        value: u32,
    }

    #[test]
    fn test_packed_records() {
        let data = [1u8, 0x10, 0, 0, 0, 2, 0x20, 0, 0, 0, 0xFF];
        let mut reader = BinaryReader::new(&data);

        let records: Vec<Record> = reader.read_structs(2).unwrap();
        assert_eq!(records[0].tag, 1);
        assert_eq!({ records[1].value }, 0x20);
        assert_eq!(reader.position(), 10);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn test_short_buffer() {
        let mut reader = BinaryReader::new(&[1, 2, 3]);
        assert!(matches!(
            reader.read_struct::<u32>(),
            Err(Error::UnexpectedEof { needed: 4, available: 3 })
        ));

        let mut reader = BinaryReader::new(&[0u8; 10]);
        assert!(reader.read_structs::<Record>(3).is_err());
        assert_eq!(reader.position(), 0);
    }
}
