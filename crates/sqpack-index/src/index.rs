//! Index file reader.

use std::fs::File;
use std::ops::Deref;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use memmap2::Mmap;
use sqpack_common::{hash, BinaryReader};
use tracing::{debug, info};

use crate::directory::{parse_table, Directory, FileTable, FxHashMap};
use crate::entry::{FileEntry, SynonymEntry};
use crate::layout::{
    DirectoryRecord, IndexFileInfo, IndexKind, NarrowHashRecord, NarrowSynonymRecord,
    SynonymRecord, VersionInfo, WideSynonymRecord,
};
use crate::{Error, Result};

/// Backing bytes of an index.
enum IndexData {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for IndexData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap,
            Self::Owned(bytes) => bytes,
        }
    }
}

/// A parsed `.index` or `.index2` file.
///
/// Headers, synonyms and the directory table are parsed when the index is
/// opened; per-directory file tables are decoded on first access. Contents
/// never change afterwards, so an index can be shared between threads.
pub struct IndexFile {
    name: String,
    data: IndexData,
    version: VersionInfo,
    info: IndexFileInfo,
    kind: IndexKind,
    synonyms: Vec<SynonymEntry>,
    directories: FxHashMap<u32, Directory>,
    /// Main hash table of a narrow index without directories.
    flat: OnceLock<FileTable>,
    by_key: OnceLock<FxHashMap<u64, Arc<FileEntry>>>,
}

impl IndexFile {
    /// Memory-map and parse an index file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Self::parse(name, IndexData::Mapped(mmap))
    }

    /// Parse an index held in memory.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        Self::parse(name.into(), IndexData::Owned(data))
    }

    fn parse(name: String, data: IndexData) -> Result<Self> {
        let mut reader = BinaryReader::new(&data);

        let version: VersionInfo = reader
            .read_struct()
            .map_err(|e| Error::CorruptIndex(format!("version header: {e}")))?;
        if version.magic != VersionInfo::MAGIC {
            return Err(Error::CorruptIndex(format!(
                "bad magic {:?}",
                String::from_utf8_lossy(&version.magic)
            )));
        }
        let declared = version.size;
        if declared != VersionInfo::SIZE {
            return Err(Error::CorruptIndex(format!(
                "version header declares {declared:#x} bytes, expected {:#x}",
                VersionInfo::SIZE
            )));
        }

        let info: IndexFileInfo = reader
            .read_struct()
            .map_err(|e| Error::CorruptIndex(format!("index header: {e}")))?;
        let kind = IndexKind::from_index_type(info.index_type);

        let synonyms = match kind {
            IndexKind::Wide => parse_synonyms::<WideSynonymRecord>(&data, &info)?,
            IndexKind::Narrow => parse_synonyms::<NarrowSynonymRecord>(&data, &info)?,
        };

        let dir_slice = table_slice(
            &data,
            "directory",
            info.dir_index_data_offset,
            info.dir_index_data_size,
        )?;
        let count = dir_slice.len() / DirectoryRecord::SIZE;
        let mut dir_reader = BinaryReader::new(dir_slice);
        let mut directories = FxHashMap::with_capacity_and_hasher(count, Default::default());
        for _ in 0..count {
            let record: DirectoryRecord = dir_reader.read_struct()?;
            directories.insert(record.dir_hash, Directory::from_record(&record));
        }

        info!(
            "Loaded index {name}: {:?}, {} directories, {} synonyms",
            kind,
            directories.len(),
            synonyms.len()
        );

        Ok(Self {
            name,
            data,
            version,
            info,
            kind,
            synonyms,
            directories,
            flat: OnceLock::new(),
            by_key: OnceLock::new(),
        })
    }

    /// File name the index was opened from.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    #[inline]
    pub fn version_info(&self) -> &VersionInfo {
        &self.version
    }

    #[inline]
    pub fn info(&self) -> &IndexFileInfo {
        &self.info
    }

    /// Collision records.
    #[inline]
    pub fn synonyms(&self) -> &[SynonymEntry] {
        &self.synonyms
    }

    /// Iterate over directories in no particular order.
    pub fn directories(&self) -> impl Iterator<Item = &Directory> + '_ {
        self.directories.values()
    }

    /// Whether files are addressed by full-path hash instead of directories.
    pub fn is_flat(&self) -> bool {
        self.kind == IndexKind::Narrow && self.directories.is_empty()
    }

    /// Find a directory by path.
    pub fn get_directory(&self, path: &str) -> Result<&Directory> {
        let dir = self
            .directories
            .get(&hash::hash_str(path))
            .ok_or_else(|| Error::DirectoryNotFound(path.to_string()))?;
        dir.set_path(path);
        Ok(dir)
    }

    /// Find a directory by hash.
    pub fn get_directory_by_hash(&self, dir_hash: u32) -> Result<&Directory> {
        self.directories
            .get(&dir_hash)
            .ok_or_else(|| Error::DirectoryNotFound(format!("~{dir_hash:08x}")))
    }

    /// All files of a directory.
    pub fn files_in(&self, dir: &Directory) -> Result<Vec<Arc<FileEntry>>> {
        Ok(dir.files(&self.data, self.kind)?.values().cloned().collect())
    }

    /// Number of files across the index. Decodes every table.
    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.keys()?.len())
    }

    /// Every file of the index. Decodes every table.
    pub fn entries(&self) -> Result<Vec<Arc<FileEntry>>> {
        Ok(self.keys()?.values().cloned().collect())
    }

    /// Look up a file by its full path.
    pub fn get_file(&self, path: &str) -> Result<Arc<FileEntry>> {
        let entry = if self.is_flat() {
            self.flat_table()?
                .get(&hash::full_path_hash(path))
                .cloned()
                .ok_or_else(|| Error::FileNotFound(path.to_string()))?
        } else {
            let (dir_path, file_name) = hash::split_path(path);
            let dir = self.get_directory(dir_path)?;
            dir.files(&self.data, self.kind)?
                .get(&hash::hash_str(file_name))
                .cloned()
                .ok_or_else(|| Error::FileNotFound(path.to_string()))?
        };

        if entry.is_synonym() {
            return self.resolve_synonym(&entry, Some(path));
        }
        entry.set_path(path);
        Ok(entry)
    }

    /// Look up a file by hashes the caller already computed.
    ///
    /// For flat indexes `file_hash` is the full-path hash and `dir_hash` is
    /// ignored.
    pub fn get_file_by_hashes(&self, dir_hash: u32, file_hash: u32) -> Result<Arc<FileEntry>> {
        let table = if self.is_flat() {
            self.flat_table()?
        } else {
            self.get_directory_by_hash(dir_hash)?
                .files(&self.data, self.kind)?
        };
        let entry = table
            .get(&file_hash)
            .cloned()
            .ok_or_else(|| Error::FileNotFound(format!("~{dir_hash:08x}/~{file_hash:08x}")))?;

        if entry.is_synonym() {
            return self.resolve_synonym(&entry, None);
        }
        Ok(entry)
    }

    /// Look up a file by its stored key.
    ///
    /// Wide keys are `(dir_hash << 32) | file_hash`; narrow keys are the
    /// 32-bit hash. When several narrow directories share a file hash the
    /// first one decoded wins, so prefer path or hash-pair lookups there.
    pub fn get_file_by_key(&self, key: u64) -> Result<Arc<FileEntry>> {
        let entry = self
            .keys()?
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::FileNotFound(format!("key {key:#x}")))?;

        if entry.is_synonym() {
            return self.resolve_synonym(&entry, None);
        }
        Ok(entry)
    }

    /// Replace a colliding entry with the synonym record it stands for.
    ///
    /// Candidates share the entry's key. A known path selects the record
    /// with that literal path; otherwise the lowest synonym index wins.
    fn resolve_synonym(&self, entry: &FileEntry, path: Option<&str>) -> Result<Arc<FileEntry>> {
        let mut candidates: Vec<&SynonymEntry> = self
            .synonyms
            .iter()
            .filter(|s| s.key == entry.key())
            .collect();
        candidates.sort_by_key(|s| s.synonym_index);

        let chosen = match path {
            Some(path) => candidates
                .into_iter()
                .find(|s| s.path.eq_ignore_ascii_case(path)),
            None => candidates.into_iter().next(),
        }
        .ok_or_else(|| {
            Error::FileNotFound(path.map_or_else(|| entry.display_path(), str::to_string))
        })?;

        debug!(
            "Resolved synonym {:#x} to {} (index {})",
            entry.key(),
            chosen.path,
            chosen.synonym_index
        );
        Ok(Arc::new(FileEntry::from_synonym(entry, chosen)))
    }

    fn flat_table(&self) -> Result<&FileTable> {
        if let Some(table) = self.flat.get() {
            return Ok(table);
        }
        let slice = table_slice(
            &self.data,
            "hash",
            self.info.index_data_offset,
            self.info.index_data_size,
        )?;
        let table = parse_table::<NarrowHashRecord>(slice, None, self.kind)?;
        Ok(self.flat.get_or_init(move || table))
    }

    fn keys(&self) -> Result<&FxHashMap<u64, Arc<FileEntry>>> {
        if let Some(keys) = self.by_key.get() {
            return Ok(keys);
        }

        let mut keys = FxHashMap::default();
        if self.is_flat() {
            for entry in self.flat_table()?.values() {
                keys.entry(entry.key()).or_insert_with(|| entry.clone());
            }
        } else {
            for dir in self.directories.values() {
                for entry in dir.files(&self.data, self.kind)?.values() {
                    keys.entry(entry.key()).or_insert_with(|| entry.clone());
                }
            }
        }

        Ok(self.by_key.get_or_init(move || keys))
    }
}

impl std::fmt::Debug for IndexFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexFile")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("directories", &self.directories.len())
            .field("synonyms", &self.synonyms.len())
            .finish()
    }
}

fn table_slice<'a>(data: &'a [u8], table: &str, offset: u32, size: u32) -> Result<&'a [u8]> {
    if size == 0 {
        return Ok(&[]);
    }
    let start = offset as usize;
    let end = start + size as usize;
    data.get(start..end).ok_or_else(|| {
        Error::CorruptIndex(format!(
            "{table} table {start:#x}..{end:#x} outside index of {} bytes",
            data.len()
        ))
    })
}

fn parse_synonyms<R: SynonymRecord>(data: &[u8], info: &IndexFileInfo) -> Result<Vec<SynonymEntry>> {
    let slice = table_slice(data, "synonym", info.synonym_data_offset, info.synonym_data_size)?;
    let mut reader = BinaryReader::new(slice);
    let records: Vec<R> = reader.read_structs(slice.len() / R::SIZE)?;
    Ok(records.iter().map(SynonymEntry::from_record).collect())
}
