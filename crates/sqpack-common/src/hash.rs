//! Path hashing.
//!
//! Every key in an index file is the bitwise complement of the standard
//! CRC-32 (zlib polynomial) of an ASCII-lowercased path fragment. Directory
//! parts and file names are hashed independently; the flat `index2` table
//! hashes the full path instead.

/// Hash a raw byte string the way the index does.
///
/// Only ASCII letters are lowercased, other bytes pass through unchanged.
#[inline]
pub fn hash_bytes(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    let mut buf = [0u8; 256];
    for chunk in data.chunks(buf.len()) {
        let lowered = &mut buf[..chunk.len()];
        lowered.copy_from_slice(chunk);
        lowered.make_ascii_lowercase();
        hasher.update(lowered);
    }
    !hasher.finalize()
}

/// Hash a string.
///
/// The string is encoded as UTF-8 before hashing.
#[inline]
pub fn hash_str(s: &str) -> u32 {
    hash_bytes(s.as_bytes())
}

/// Split a path into its directory part and file name at the last `/`.
///
/// A path without a separator has an empty directory part.
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

/// Directory hash and file hash of a full path.
pub fn path_hashes(path: &str) -> (u32, u32) {
    let (dir, file) = split_path(path);
    (hash_str(dir), hash_str(file))
}

/// Hash of the whole path, used by flat `index2` tables.
#[inline]
pub fn full_path_hash(path: &str) -> u32 {
    hash_str(path)
}

/// Combined 64-bit key used by wide (`index`) hash tables.
///
/// The directory hash occupies the high half and the file hash the low half.
#[inline]
pub fn combined_key(dir_hash: u32, file_hash: u32) -> u64 {
    (u64::from(dir_hash) << 32) | u64::from(file_hash)
}
