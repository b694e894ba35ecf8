//! Archive catalog.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqpack_common::ArchiveIdentity;
use sqpack_index::{FileEntry, IndexFile};
use tracing::info;

use crate::container::{Containers, PackOptions, Residency};
use crate::file::{SqFile, TypedFile};
use crate::{Error, Result};

/// One archive: its indexes and data containers.
///
/// Lookups try the primary `.index` first and fall back to the secondary
/// `.index2`. Either may be missing.
pub struct Pack {
    identity: ArchiveIdentity,
    primary: Option<IndexFile>,
    secondary: Option<IndexFile>,
    containers: Containers,
}

impl Pack {
    /// Open the archive `identity` under `root`.
    pub fn open(root: impl AsRef<Path>, identity: ArchiveIdentity, options: PackOptions) -> Result<Self> {
        let root = root.as_ref();
        let primary = open_index(identity.index_path(root))?;
        let secondary = open_index(identity.index2_path(root))?;

        info!(
            "Opened pack {identity}: index {}, index2 {}",
            describe(primary.as_ref()),
            describe(secondary.as_ref())
        );

        Ok(Self {
            identity,
            primary,
            secondary,
            containers: Containers::new(root, identity, options.residency),
        })
    }

    #[inline]
    pub fn identity(&self) -> ArchiveIdentity {
        self.identity
    }

    /// The `.index` file, if present.
    pub fn primary(&self) -> Option<&IndexFile> {
        self.primary.as_ref()
    }

    /// The `.index2` file, if present.
    pub fn secondary(&self) -> Option<&IndexFile> {
        self.secondary.as_ref()
    }

    /// Both indexes in lookup order.
    pub fn indexes(&self) -> impl Iterator<Item = &IndexFile> + '_ {
        self.primary.iter().chain(self.secondary.iter())
    }

    pub fn containers(&self) -> &Containers {
        &self.containers
    }

    pub fn residency(&self) -> Residency {
        self.containers.residency()
    }

    pub fn set_residency(&self, residency: Residency) {
        self.containers.set_residency(residency);
    }

    /// Look up a file by path.
    pub fn get_file(&self, path: &str) -> Result<Arc<FileEntry>> {
        self.lookup(|index| index.get_file(path), || path.to_string())
    }

    /// Look up a file by its stored key.
    pub fn get_file_by_key(&self, key: u64) -> Result<Arc<FileEntry>> {
        self.lookup(|index| index.get_file_by_key(key), || format!("key {key:#x}"))
    }

    /// Look up a file by directory and file hash.
    ///
    /// Flat `.index2` tables are keyed by full-path hashes and are skipped.
    pub fn get_file_by_hashes(&self, dir_hash: u32, file_hash: u32) -> Result<Arc<FileEntry>> {
        self.lookup(
            |index| {
                if index.is_flat() {
                    Err(sqpack_index::Error::FileNotFound(String::new()))
                } else {
                    index.get_file_by_hashes(dir_hash, file_hash)
                }
            },
            || format!("~{dir_hash:08x}/~{file_hash:08x}"),
        )
    }

    fn lookup<F, N>(&self, find: F, name: N) -> Result<Arc<FileEntry>>
    where
        F: Fn(&IndexFile) -> sqpack_index::Result<Arc<FileEntry>>,
        N: FnOnce() -> String,
    {
        for index in self.indexes() {
            match find(index) {
                Ok(entry) => return Ok(entry),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(Error::FileNotFound(name()))
    }

    /// Open a file for typed access.
    pub fn open_file(&self, entry: &Arc<FileEntry>) -> Result<SqFile<'_>> {
        SqFile::open(&self.containers, entry.clone())
    }

    /// Decoded payload of a file.
    pub fn read_payload(&self, entry: &Arc<FileEntry>) -> Result<Vec<u8>> {
        Ok(self.read_typed_file(entry)?.payload)
    }

    /// Decoded payload with its typed header.
    pub fn read_typed_file(&self, entry: &Arc<FileEntry>) -> Result<TypedFile> {
        self.open_file(entry)?.into_typed()
    }

    /// Look up and decode a file by path.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let entry = self.get_file(path)?;
        self.read_payload(&entry)
    }

    /// Decode several files in parallel.
    #[cfg(feature = "parallel")]
    pub fn read_parallel(&self, entries: &[Arc<FileEntry>]) -> Vec<Result<Vec<u8>>> {
        use rayon::prelude::*;

        entries
            .par_iter()
            .map(|entry| self.read_payload(entry))
            .collect()
    }
}

impl std::fmt::Debug for Pack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pack")
            .field("identity", &self.identity)
            .field("primary", &self.primary)
            .field("secondary", &self.secondary)
            .field("containers", &self.containers)
            .finish()
    }
}

fn open_index(path: PathBuf) -> Result<Option<IndexFile>> {
    if !path.is_file() {
        return Ok(None);
    }
    Ok(Some(IndexFile::open(&path)?))
}

fn describe(index: Option<&IndexFile>) -> String {
    match index {
        Some(index) => format!("{} directories", index.directories().count()),
        None => "missing".to_string(),
    }
}
