//! SqPack index file reader.
//!
//! An index maps path hashes to locations inside numbered data containers.
//! Two variants exist:
//!
//! - `.index` ("wide"): 16-byte records keyed by `(dir_hash << 32) | file_hash`
//! - `.index2` ("narrow"): 8-byte records keyed by a 32-bit hash
//!
//! Both start with two 1024-byte headers and may carry a synonym table that
//! disambiguates paths whose hashes collide.
//!
//! # Example
//!
//! ```no_run
//! use sqpack_index::IndexFile;
//!
//! let index = IndexFile::open("sqpack/ffxiv/0a0000.win32.index")?;
//! let entry = index.get_file("exd/root.exl")?;
//! println!("dat{} @ {:#x}", entry.container_id(), entry.byte_offset());
//! # Ok::<(), sqpack_index::Error>(())
//! ```

mod directory;
mod entry;
mod error;
mod index;
pub mod layout;

pub use directory::{Directory, FileTable};
pub use entry::{FileEntry, SynonymEntry};
pub use error::{Error, Result};
pub use index::IndexFile;
pub use layout::{IndexKind, PackedLocation};
