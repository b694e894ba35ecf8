//! Archive identities.
//!
//! An archive is addressed by a (category, expansion, sequence) triple. The
//! triple is derived from the leading segments of a game path and determines
//! the on-disk names of the archive's index and data container files:
//!
//! ```text
//! bg/ex1/01_abr_a1/fld/a1f1/level/bg.lgb
//! ^^ ^^^ ^^
//! |  |   sequence 0x01
//! |  expansion 1 (directory "ex1")
//! category bg (0x02)            => ex1/020101.win32.index
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Archive category, the first segment of every game path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Category {
    Common = 0x00,
    BgCommon = 0x01,
    Bg = 0x02,
    Cut = 0x03,
    Chara = 0x04,
    Shader = 0x05,
    Ui = 0x06,
    Sound = 0x07,
    Vfx = 0x08,
    Exd = 0x0a,
    GameScript = 0x0b,
    Music = 0x0c,
    SqpackTest = 0x12,
    Debug = 0x13,
}

impl Category {
    /// All categories in code order.
    pub const ALL: [Category; 14] = [
        Self::Common,
        Self::BgCommon,
        Self::Bg,
        Self::Cut,
        Self::Chara,
        Self::Shader,
        Self::Ui,
        Self::Sound,
        Self::Vfx,
        Self::Exd,
        Self::GameScript,
        Self::Music,
        Self::SqpackTest,
        Self::Debug,
    ];

    /// Path segment naming this category.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::BgCommon => "bgcommon",
            Self::Bg => "bg",
            Self::Cut => "cut",
            Self::Chara => "chara",
            Self::Shader => "shader",
            Self::Ui => "ui",
            Self::Sound => "sound",
            Self::Vfx => "vfx",
            Self::Exd => "exd",
            Self::GameScript => "game_script",
            Self::Music => "music",
            Self::SqpackTest => "_sqpack_test",
            Self::Debug => "_debug",
        }
    }

    /// Numeric code used in archive file names.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up a category by its path segment (ASCII case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }

    /// Look up a category by its numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of one index/data file set.
///
/// Immutable and cheap to copy; used as the key of the pack registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArchiveIdentity {
    pub category: Category,
    pub expansion: u8,
    pub sequence: u8,
}

impl ArchiveIdentity {
    /// Create an identity from its parts.
    pub const fn new(category: Category, expansion: u8, sequence: u8) -> Self {
        Self {
            category,
            expansion,
            sequence,
        }
    }

    /// Derive the identity from a game path.
    ///
    /// The first segment must name a category. The second segment gives the
    /// expansion when it reads `exN`; the third gives the sequence when it
    /// starts with two hex digits and an underscore. Anything else in those
    /// positions falls back to 0.
    pub fn from_path(path: &str) -> Result<Self> {
        let mut segments = path.split('/');
        let first = segments.next().unwrap_or_default();
        let category = match path.find('/') {
            Some(_) => Category::from_name(first),
            None => None,
        }
        .ok_or_else(|| Error::UnknownCategory(path.to_string()))?;

        let rest: Vec<&str> = segments.collect();
        // Only directory segments qualify: a bare "bg/file" has no expansion.
        if rest.len() < 2 {
            return Ok(Self::new(category, 0, 0));
        }

        let expansion = parse_expansion(rest[0]).unwrap_or(0);
        let sequence = parse_sequence(rest[1]).unwrap_or(0);

        Ok(Self::new(category, expansion, sequence))
    }

    /// Name of the directory holding this archive's files.
    pub fn expansion_dir(&self) -> String {
        if self.expansion == 0 {
            "ffxiv".to_string()
        } else {
            format!("ex{}", self.expansion)
        }
    }

    /// File stem shared by all of this archive's files, e.g. `020101`.
    pub fn file_stem(&self) -> String {
        format!(
            "{:02x}{:02x}{:02x}",
            self.category.code(),
            self.expansion,
            self.sequence
        )
    }

    /// Path of the primary (`.index`) file.
    pub fn index_path(&self, root: &Path) -> PathBuf {
        self.archive_file(root, "index")
    }

    /// Path of the secondary (`.index2`) file.
    pub fn index2_path(&self, root: &Path) -> PathBuf {
        self.archive_file(root, "index2")
    }

    /// Path of data container `container_id`.
    pub fn dat_path(&self, root: &Path, container_id: u8) -> PathBuf {
        self.archive_file(root, &format!("dat{container_id}"))
    }

    fn archive_file(&self, root: &Path, kind: &str) -> PathBuf {
        root.join(self.expansion_dir())
            .join(format!("{}.win32.{kind}", self.file_stem()))
    }
}

impl fmt::Display for ArchiveIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{:02x}",
            self.category,
            self.expansion_dir(),
            self.sequence
        )
    }
}

/// `exN` with a single digit N below 9.
fn parse_expansion(segment: &str) -> Option<u8> {
    match segment.strip_prefix("ex")?.as_bytes() {
        &[digit @ b'0'..=b'8'] => Some(digit - b'0'),
        _ => None,
    }
}

fn parse_sequence(segment: &str) -> Option<u8> {
    let bytes = segment.as_bytes();
    if bytes.len() < 3 || bytes[2] != b'_' {
        return None;
    }
    std::str::from_utf8(&bytes[..2])
        .ok()
        .and_then(|hex| u8::from_str_radix(hex, 16).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_lookup() {
        assert_eq!(Category::from_name("bg"), Some(Category::Bg));
        assert_eq!(Category::from_name("EXD"), Some(Category::Exd));
        assert_eq!(Category::from_name("nope"), None);
        assert_eq!(Category::from_code(0x0c), Some(Category::Music));
        assert_eq!(Category::from_code(0x09), None);
    }

    #[test]
    fn test_from_path_full() {
        let id = ArchiveIdentity::from_path("bg/ex1/01_abr_a1/fld/a1f1/level/bg.lgb").unwrap();
        assert_eq!(id, ArchiveIdentity::new(Category::Bg, 1, 1));
        assert_eq!(id.file_stem(), "020101");
        assert_eq!(id.expansion_dir(), "ex1");
    }

    #[test]
    fn test_from_path_defaults() {
        let id = ArchiveIdentity::from_path("exd/root.exl").unwrap();
        assert_eq!(id, ArchiveIdentity::new(Category::Exd, 0, 0));

        let id = ArchiveIdentity::from_path("bg/ffxiv/sea_s1/twn/s1t1/level/bg.lgb").unwrap();
        assert_eq!(id, ArchiveIdentity::new(Category::Bg, 0, 0));

        let id = ArchiveIdentity::from_path("bg/test.dat").unwrap();
        assert_eq!(id, ArchiveIdentity::new(Category::Bg, 0, 0));
    }

    #[test]
    fn test_from_path_tolerates_malformed() {
        let id = ArchiveIdentity::from_path("bg/exX/zz_foo/bar").unwrap();
        assert_eq!(id, ArchiveIdentity::new(Category::Bg, 0, 0));

        let id = ArchiveIdentity::from_path("bg/ex2/0g_foo/bar").unwrap();
        assert_eq!(id, ArchiveIdentity::new(Category::Bg, 2, 0));

        for path in ["bg/ex12/01_foo/bar", "bg/ex9/01_foo/bar", "bg/ex/01_foo/bar"] {
            let id = ArchiveIdentity::from_path(path).unwrap();
            assert_eq!(id, ArchiveIdentity::new(Category::Bg, 0, 1), "{path}");
        }
    }

    #[test]
    fn test_unknown_category() {
        assert!(matches!(
            ArchiveIdentity::from_path("nothing/here"),
            Err(Error::UnknownCategory(_))
        ));
        assert!(matches!(
            ArchiveIdentity::from_path("bg"),
            Err(Error::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_file_names() {
        let root = Path::new("/game/sqpack");
        let id = ArchiveIdentity::new(Category::Chara, 0, 0);
        assert_eq!(
            id.index_path(root),
            PathBuf::from("/game/sqpack/ffxiv/040000.win32.index")
        );
        assert_eq!(
            id.index2_path(root),
            PathBuf::from("/game/sqpack/ffxiv/040000.win32.index2")
        );
        let id = ArchiveIdentity::new(Category::Bg, 3, 0x1a);
        assert_eq!(
            id.dat_path(root, 7),
            PathBuf::from("/game/sqpack/ex3/02031a.win32.dat7")
        );
    }
}
