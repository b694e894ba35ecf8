//! Index entries.

use std::fmt;

use parking_lot::RwLock;

use crate::layout::{IndexKind, PackedLocation, SynonymRecord, SYNONYM_PATH_LEN};

/// A file located by an index.
///
/// Identity is the stored key; the location never changes after parsing.
/// A readable path is attached when the entry is looked up by name. Setting
/// it again simply replaces it.
pub struct FileEntry {
    key: u64,
    dir_hash: u32,
    file_hash: u32,
    location: PackedLocation,
    kind: IndexKind,
    path: RwLock<Option<String>>,
}

impl FileEntry {
    pub(crate) fn new(
        key: u64,
        dir_hash: u32,
        file_hash: u32,
        location: PackedLocation,
        kind: IndexKind,
    ) -> Self {
        Self {
            key,
            dir_hash,
            file_hash,
            location,
            kind,
            path: RwLock::new(None),
        }
    }

    /// Entry standing in for a colliding hash-table entry.
    ///
    /// Keeps the key of the colliding entry but takes the location and path
    /// from the synonym record.
    pub(crate) fn from_synonym(entry: &FileEntry, synonym: &SynonymEntry) -> Self {
        Self {
            key: entry.key,
            dir_hash: entry.dir_hash,
            file_hash: entry.file_hash,
            location: synonym.location,
            kind: entry.kind,
            path: RwLock::new(Some(synonym.path.clone())),
        }
    }

    /// Stored key: the combined 64-bit key for wide indexes, the 32-bit hash
    /// for narrow ones.
    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Hash of the owning directory (0 for flat `index2` tables).
    #[inline]
    pub fn dir_hash(&self) -> u32 {
        self.dir_hash
    }

    #[inline]
    pub fn file_hash(&self) -> u32 {
        self.file_hash
    }

    #[inline]
    pub fn location(&self) -> PackedLocation {
        self.location
    }

    /// Data container holding the file, 0..=7.
    #[inline]
    pub fn container_id(&self) -> u8 {
        self.location.container_id()
    }

    /// Offset in 128-byte units.
    #[inline]
    pub fn block_offset(&self) -> u32 {
        self.location.block_offset()
    }

    /// Offset in bytes inside the data container.
    #[inline]
    pub fn byte_offset(&self) -> u64 {
        self.location.byte_offset()
    }

    #[inline]
    pub fn is_synonym(&self) -> bool {
        self.location.is_synonym()
    }

    /// Variant of the index this entry came from.
    #[inline]
    pub fn index_kind(&self) -> IndexKind {
        self.kind
    }

    /// Path attached by a name lookup, if any.
    pub fn path(&self) -> Option<String> {
        self.path.read().clone()
    }

    pub(crate) fn set_path(&self, path: &str) {
        let mut slot = self.path.write();
        if slot.as_deref() != Some(path) {
            *slot = Some(path.to_string());
        }
    }

    /// Path if known, otherwise a placeholder built from the hashes.
    pub fn display_path(&self) -> String {
        match self.path() {
            Some(path) => path,
            None => format!("~{:08x}/~{:08x}", self.dir_hash, self.file_hash),
        }
    }
}

impl fmt::Debug for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("path", &self.display_path())
            .field("key", &format_args!("{:#x}", self.key))
            .field("location", &self.location)
            .finish()
    }
}

/// A recorded collision: the literal path of one of several files sharing
/// a hash, with its own location.
#[derive(Debug, Clone)]
pub struct SynonymEntry {
    /// Key shared with the colliding hash-table entry
    pub key: u64,
    pub location: PackedLocation,
    pub synonym_index: u32,
    pub path: String,
}

impl SynonymEntry {
    pub(crate) fn from_record<R: SynonymRecord>(record: &R) -> Self {
        let raw = record.path_bytes();
        let len = raw.iter().position(|&b| b == 0).unwrap_or(SYNONYM_PATH_LEN);
        Self {
            key: record.key(),
            location: record.location(),
            synonym_index: record.synonym_index(),
            path: String::from_utf8_lossy(&raw[..len]).into_owned(),
        }
    }
}
