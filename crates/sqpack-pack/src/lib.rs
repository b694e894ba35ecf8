//! SqPack archive reader.
//!
//! Ties the index files of an archive to its data containers and decodes
//! stored files:
//!
//! - [`PackManager`] - opens archives on demand, keyed by [`ArchiveIdentity`]
//! - [`Pack`] - one archive, looking paths up in its `.index`/`.index2`
//! - [`Containers`] - streamed or memory-resident `.datN` access
//! - [`block`] - the 16-byte-header, 128-byte-aligned block codec
//! - [`file`] - generic, model and texture headers and payloads
//!
//! # Example
//!
//! ```no_run
//! use sqpack_pack::{PackManager, PackOptions};
//!
//! let manager = PackManager::with_options("game/sqpack", PackOptions::new().resident())?;
//! let data = manager.read_file("exd/root.exl")?;
//! println!("{}", String::from_utf8_lossy(&data));
//! # Ok::<(), sqpack_pack::Error>(())
//! ```
//!
//! [`ArchiveIdentity`]: sqpack_common::ArchiveIdentity

pub mod block;
mod container;
mod error;
pub mod file;
mod manager;
mod pack;

pub use container::{ContainerSource, Containers, PackOptions, Residency};
pub use error::{Error, Result};
pub use file::{FileType, ModelLayout, ModelRegion, SqFile, TypedFile, TypedHeader};
pub use manager::PackManager;
pub use pack::Pack;
