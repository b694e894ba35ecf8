//! Directory entries and their lazily built file tables.

use std::fmt;
use std::hash::BuildHasherDefault;
use std::sync::{Arc, OnceLock};

use hashbrown::HashMap as FastHashMap;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use sqpack_common::BinaryReader;

use crate::entry::FileEntry;
use crate::layout::{DirectoryRecord, HashRecord, IndexKind, NarrowHashRecord, WideHashRecord};
use crate::{Error, Result};

pub(crate) type FxHashMap<K, V> = FastHashMap<K, V, BuildHasherDefault<FxHasher>>;

/// File table of one directory, keyed by file hash.
pub type FileTable = FxHashMap<u32, Arc<FileEntry>>;

/// A directory of an index file.
///
/// Owns the slice of the main hash table that lists its files. The table is
/// only decoded on first use.
pub struct Directory {
    hash: u32,
    offset: u32,
    size: u32,
    path: RwLock<Option<String>>,
    files: OnceLock<FileTable>,
}

impl Directory {
    pub(crate) fn from_record(record: &DirectoryRecord) -> Self {
        Self {
            hash: record.dir_hash,
            offset: record.offset,
            size: record.size,
            path: RwLock::new(None),
            files: OnceLock::new(),
        }
    }

    #[inline]
    pub fn hash(&self) -> u32 {
        self.hash
    }

    /// Absolute offset of the directory's hash-table slice.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Size in bytes of the directory's hash-table slice.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Directory path attached by a name lookup, if any.
    pub fn path(&self) -> Option<String> {
        self.path.read().clone()
    }

    pub(crate) fn set_path(&self, path: &str) {
        let mut slot = self.path.write();
        if slot.as_deref() != Some(path) {
            *slot = Some(path.to_string());
        }
    }

    /// Whether the file table has been decoded yet.
    pub fn is_loaded(&self) -> bool {
        self.files.get().is_some()
    }

    /// File table, decoding it from `data` on first call.
    ///
    /// Concurrent first calls may both decode; the first table installed is
    /// kept and the others are dropped.
    pub(crate) fn files(&self, data: &[u8], kind: IndexKind) -> Result<&FileTable> {
        if let Some(files) = self.files.get() {
            return Ok(files);
        }

        let start = self.offset as usize;
        let end = start + self.size as usize;
        let slice = data.get(start..end).ok_or_else(|| {
            Error::CorruptIndex(format!(
                "directory {:08x} table {start:#x}..{end:#x} outside index of {} bytes",
                self.hash,
                data.len()
            ))
        })?;

        let table = match kind {
            IndexKind::Wide => parse_table::<WideHashRecord>(slice, Some(self.hash), kind)?,
            IndexKind::Narrow => parse_table::<NarrowHashRecord>(slice, Some(self.hash), kind)?,
        };

        Ok(self.files.get_or_init(move || table))
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("hash", &format_args!("{:08x}", self.hash))
            .field("path", &self.path())
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish()
    }
}

/// Decode a run of hash-table records into entries keyed by file hash.
///
/// `dir_hash` is `None` for flat tables, whose keys hash full paths.
pub(crate) fn parse_table<R: HashRecord>(
    slice: &[u8],
    dir_hash: Option<u32>,
    kind: IndexKind,
) -> Result<FileTable> {
    let count = slice.len() / R::SIZE;
    let mut reader = BinaryReader::new(slice);
    let mut table = FileTable::with_capacity_and_hasher(count, Default::default());

    for _ in 0..count {
        let record: R = reader.read_struct()?;
        let key = record.key();
        // Low half of a wide key, all of a narrow one.
        let file_hash = key as u32;
        let entry = FileEntry::new(
            key,
            dir_hash.unwrap_or_default(),
            file_hash,
            record.location(),
            kind,
        );
        table.insert(file_hash, Arc::new(entry));
    }

    Ok(table)
}
