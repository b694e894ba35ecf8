//! Pack registry.

use std::hash::BuildHasherDefault;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHasher;
use sqpack_common::ArchiveIdentity;
use sqpack_index::FileEntry;
use tracing::debug;

use crate::container::{PackOptions, Residency};
use crate::file::TypedFile;
use crate::pack::Pack;
use crate::Result;

type FxHashMap<K, V> = HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Slot holding one pack, locked while the pack is being opened.
type Slot = Arc<Mutex<Option<Arc<Pack>>>>;

/// Opens packs on demand and keeps them for its own lifetime.
///
/// Each identity is opened at most once: concurrent first requests wait for
/// the one doing the work. Failed opens are not remembered.
pub struct PackManager {
    root: PathBuf,
    options: RwLock<PackOptions>,
    packs: Mutex<FxHashMap<ArchiveIdentity, Slot>>,
}

impl PackManager {
    /// Create a manager over a `sqpack` directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(root, PackOptions::default())
    }

    pub fn with_options(root: impl Into<PathBuf>, options: PackOptions) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("sqpack directory not found: {}", root.display()),
            )
            .into());
        }
        Ok(Self {
            root,
            options: RwLock::new(options),
            packs: Mutex::new(FxHashMap::default()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Options used for packs opened from now on.
    pub fn options(&self) -> PackOptions {
        *self.options.read()
    }

    /// Pack holding `path`.
    pub fn get_pack(&self, path: &str) -> Result<Arc<Pack>> {
        self.get_pack_by_id(ArchiveIdentity::from_path(path)?)
    }

    /// Pack for an identity, opening it on first use.
    pub fn get_pack_by_id(&self, identity: ArchiveIdentity) -> Result<Arc<Pack>> {
        let slot = self.packs.lock().entry(identity).or_default().clone();

        let mut guard = slot.lock();
        if let Some(pack) = guard.as_ref() {
            return Ok(pack.clone());
        }

        debug!("Opening pack {identity}");
        let pack = Arc::new(Pack::open(&self.root, identity, self.options())?);
        *guard = Some(pack.clone());
        Ok(pack)
    }

    /// Identities of the packs opened so far.
    pub fn loaded(&self) -> Vec<ArchiveIdentity> {
        let slots: Vec<(ArchiveIdentity, Slot)> = self
            .packs
            .lock()
            .iter()
            .map(|(id, slot)| (*id, slot.clone()))
            .collect();
        let mut ids: Vec<ArchiveIdentity> = slots
            .into_iter()
            .filter(|(_, slot)| slot.lock().is_some())
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    /// Change residency of every pack, including ones opened later.
    pub fn set_residency(&self, residency: Residency) {
        self.options.write().residency = residency;
        // Packs still opening hold their slot lock and are reached below.
        for identity in self.loaded() {
            if let Ok(pack) = self.get_pack_by_id(identity) {
                pack.set_residency(residency);
            }
        }
    }

    /// Look up a file, returning the pack that holds it.
    pub fn get_file(&self, path: &str) -> Result<(Arc<Pack>, Arc<FileEntry>)> {
        let pack = self.get_pack(path)?;
        let entry = pack.get_file(path)?;
        Ok((pack, entry))
    }

    /// Decoded payload of a file.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let (pack, entry) = self.get_file(path)?;
        pack.read_payload(&entry)
    }

    /// Decoded payload of a file with its typed header.
    pub fn read_typed(&self, path: &str) -> Result<TypedFile> {
        let (pack, entry) = self.get_file(path)?;
        pack.read_typed_file(&entry)
    }
}

impl std::fmt::Debug for PackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackManager")
            .field("root", &self.root)
            .field("options", &self.options())
            .field("packs", &self.packs.lock().len())
            .finish()
    }
}
