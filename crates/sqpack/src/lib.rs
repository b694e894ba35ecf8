//! SqPack - read-only access to SqPack game archives.
//!
//! This crate bundles the SqPack library crates behind one dependency.
//!
//! # Crates
//!
//! - [`sqpack_common`] - Binary reading, path hashing, archive identities
//! - [`sqpack_index`] - `.index` / `.index2` parsing and file lookup
//! - [`sqpack_tex`] - Texture headers and DDS conversion
//! - [`sqpack_pack`] - Data containers, block decoding, packs and the registry
//!
//! # Example
//!
//! ```no_run
//! use sqpack::prelude::*;
//!
//! let game = sqpack::open("game/sqpack")?;
//! let typed = game.read_typed("chara/equipment/e0001/texture/v01_c0101e0001_top_n.tex")?;
//! if typed.kind() == FileType::Texture {
//!     std::fs::write("top_n.dds", typed.to_dds()?)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use sqpack_common as common;
pub use sqpack_index as index;
pub use sqpack_pack as pack;
pub use sqpack_tex as tex;

use std::path::PathBuf;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sqpack_common::{hash, ArchiveIdentity, Category};
    pub use sqpack_index::{FileEntry, IndexFile};
    pub use sqpack_pack::{
        FileType, ModelRegion, Pack, PackManager, PackOptions, Residency, SqFile, TypedFile,
    };
    pub use sqpack_tex::{TextureFormat, TextureHeader};
}

pub use sqpack_pack::{Error, Result};

/// Open the `sqpack` directory at `root` with default options.
pub fn open(root: impl Into<PathBuf>) -> Result<pack::PackManager> {
    pack::PackManager::new(root)
}

/// Open the `sqpack` directory at `root`.
pub fn open_with(root: impl Into<PathBuf>, options: pack::PackOptions) -> Result<pack::PackManager> {
    pack::PackManager::with_options(root, options)
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_open_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(super::open(dir.path().join("missing")).is_err());

        let manager = super::open_with(dir.path(), PackOptions::new().resident()).unwrap();
        assert_eq!(manager.options().residency, Residency::Resident);
        assert!(manager.loaded().is_empty());
    }

    #[test]
    fn test_lookup_in_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let manager = super::open(dir.path()).unwrap();
        let err = manager.read_file("bg/ffxiv/a.dat").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            manager.loaded(),
            vec![ArchiveIdentity::new(Category::Bg, 0, 0)]
        );
    }
}
