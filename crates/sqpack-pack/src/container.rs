//! Data container access.
//!
//! Each archive has up to eight numbered data containers (`.dat0`..`.dat7`).
//! They are either streamed from disk through pooled handles or loaded
//! whole into memory, depending on the [`Residency`].

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use sqpack_common::ArchiveIdentity;
use sqpack_index::PackedLocation;
use tracing::debug;

use crate::block::ByteSource;
use crate::{Error, Result};

const CONTAINER_SLOTS: usize = PackedLocation::MAX_CONTAINER_ID as usize + 1;

/// Idle handles kept per container; extra handles are closed on check-in.
pub const MAX_IDLE_HANDLES: usize = 4;

/// How container bytes are accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Residency {
    /// Seek and read through file handles; nothing is kept in memory.
    #[default]
    Streamed,
    /// Read each container whole on first use and serve slices from memory.
    Resident,
}

/// Options applied to every pack a manager opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackOptions {
    pub residency: Residency,
}

impl PackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the container residency.
    pub fn residency(mut self, residency: Residency) -> Self {
        self.residency = residency;
        self
    }

    /// Shorthand for [`Residency::Resident`].
    pub fn resident(self) -> Self {
        self.residency(Residency::Resident)
    }
}

/// The data containers of one archive.
pub struct Containers {
    identity: ArchiveIdentity,
    root: PathBuf,
    residency: RwLock<Residency>,
    /// Idle handles per container. A reader takes one out for the duration
    /// of a read, so no two threads ever use the same handle.
    handles: [Mutex<Vec<File>>; CONTAINER_SLOTS],
    /// Whole-container buffers. Each slot's lock is held while it loads.
    buffers: [Mutex<Option<Arc<[u8]>>>; CONTAINER_SLOTS],
}

impl Containers {
    pub fn new(root: impl Into<PathBuf>, identity: ArchiveIdentity, residency: Residency) -> Self {
        Self {
            identity,
            root: root.into(),
            residency: RwLock::new(residency),
            handles: std::array::from_fn(|_| Mutex::new(Vec::new())),
            buffers: std::array::from_fn(|_| Mutex::new(None)),
        }
    }

    #[inline]
    pub fn identity(&self) -> ArchiveIdentity {
        self.identity
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn residency(&self) -> Residency {
        *self.residency.read()
    }

    /// Switch residency.
    ///
    /// Going back to streamed drops loaded buffers; going resident drops idle
    /// handles. Reads already in flight finish with the mode they started in.
    pub fn set_residency(&self, residency: Residency) {
        {
            let mut current = self.residency.write();
            if *current == residency {
                return;
            }
            *current = residency;
        }
        // Loads re-check the mode under their slot lock, so nothing is
        // installed after this sweep.
        match residency {
            Residency::Streamed => {
                for slot in &self.buffers {
                    slot.lock().take();
                }
            }
            Residency::Resident => {
                for pool in &self.handles {
                    pool.lock().clear();
                }
            }
        }
        debug!("{} containers now {:?}", self.identity, residency);
    }

    /// Path of a container file.
    pub fn path(&self, container: u8) -> PathBuf {
        self.identity.dat_path(&self.root, container)
    }

    /// Whether the container's buffer is loaded.
    pub fn is_loaded(&self, container: u8) -> bool {
        self.buffers
            .get(usize::from(container))
            .is_some_and(|slot| slot.lock().is_some())
    }

    /// Read exactly `len` bytes at `offset` of a container.
    pub fn read(&self, container: u8, offset: u64, len: usize) -> Result<Vec<u8>> {
        check_container(container)?;
        match self.residency() {
            Residency::Streamed => self.read_streamed(container, offset, len),
            Residency::Resident => self.read_resident(container, offset, len),
        }
    }

    /// A [`ByteSource`] over one container.
    pub fn source(&self, container: u8) -> Result<ContainerSource<'_>> {
        check_container(container)?;
        Ok(ContainerSource {
            containers: self,
            container,
        })
    }

    /// Idle handles currently pooled for a container.
    pub fn idle_handles(&self, container: u8) -> usize {
        self.handles
            .get(usize::from(container))
            .map_or(0, |pool| pool.lock().len())
    }

    fn read_streamed(&self, container: u8, offset: u64, len: usize) -> Result<Vec<u8>> {
        let pool = &self.handles[usize::from(container)];
        let idle = pool.lock().pop();
        let mut file = match idle {
            Some(file) => file,
            None => {
                let path = self.path(container);
                debug!("Opening {}", path.display());
                File::open(&path)?
            }
        };

        let result = read_full(&mut file, offset, len);
        let mut idle = pool.lock();
        if idle.len() < MAX_IDLE_HANDLES && self.residency() == Residency::Streamed {
            idle.push(file);
        }
        drop(idle);

        let buf = result?;
        if buf.len() < len {
            return Err(Error::ShortRead {
                container,
                offset,
                expected: len,
                actual: buf.len(),
            });
        }
        Ok(buf)
    }

    fn read_resident(&self, container: u8, offset: u64, len: usize) -> Result<Vec<u8>> {
        let buffer = self.buffer(container)?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(buffer.len());
        let end = start.saturating_add(len).min(buffer.len());
        if end - start < len {
            return Err(Error::ShortRead {
                container,
                offset,
                expected: len,
                actual: end - start,
            });
        }
        Ok(buffer[start..end].to_vec())
    }

    /// Whole-container buffer, loading it on first use.
    fn buffer(&self, container: u8) -> Result<Arc<[u8]>> {
        let mut slot = self.buffers[usize::from(container)].lock();
        if let Some(buffer) = slot.as_ref() {
            return Ok(buffer.clone());
        }

        let path = self.path(container);
        let buffer: Arc<[u8]> = fs::read(&path)?.into();
        debug!("Loaded {} ({} bytes)", path.display(), buffer.len());
        // A switch to streamed may have swept the slots while this loaded.
        if self.residency() == Residency::Resident {
            *slot = Some(buffer.clone());
        }
        Ok(buffer)
    }
}

impl std::fmt::Debug for Containers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Containers")
            .field("identity", &self.identity)
            .field("root", &self.root)
            .field("residency", &self.residency())
            .finish()
    }
}

/// One container viewed as a [`ByteSource`].
#[derive(Clone, Copy)]
pub struct ContainerSource<'a> {
    containers: &'a Containers,
    container: u8,
}

impl ContainerSource<'_> {
    #[inline]
    pub fn container(&self) -> u8 {
        self.container
    }
}

impl ByteSource for ContainerSource<'_> {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.containers.read(self.container, offset, len)
    }
}

fn check_container(container: u8) -> Result<()> {
    if container > PackedLocation::MAX_CONTAINER_ID {
        return Err(Error::InvalidContainer(container));
    }
    Ok(())
}

/// Read up to `len` bytes at `offset`, stopping early only at end of file.
///
/// The buffer grows with what the file actually holds, so a corrupt length
/// cannot force a huge allocation.
fn read_full(file: &mut File, offset: u64, len: usize) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = Vec::new();
    file.take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}
