mod support;

use std::sync::Arc;

use sqpack_common::{ArchiveIdentity, Category};
use sqpack_pack::{Error, FileType, PackManager, PackOptions, Residency};
use support::*;

fn game_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();

    let bg = ArchiveIdentity::new(Category::Bg, 0, 0);
    let mut dat = Dat::default();
    let offset = dat.push(&generic_file(&payload(0x2000, 1), 0x800, true));
    let index = IndexBuilder::new().file("bg/ffxiv/a.dat", 0, offset).build_wide();
    write_archive(dir.path(), bg, Some(&index), None, &[&dat]);

    let ex1 = ArchiveIdentity::new(Category::Bg, 1, 2);
    let mut dat = Dat::default();
    let offset = dat.push(&generic_file(b"expansion", 64, false));
    let index = IndexBuilder::new().file("bg/ex1/02_xyz/b.dat", 0, offset).build_wide();
    write_archive(dir.path(), ex1, Some(&index), None, &[&dat]);

    dir
}

#[test]
fn test_routes_paths_to_packs() {
    let dir = game_dir();
    let manager = PackManager::new(dir.path()).unwrap();

    assert_eq!(manager.read_file("bg/ffxiv/a.dat").unwrap(), payload(0x2000, 1));
    assert_eq!(manager.read_file("bg/ex1/02_xyz/b.dat").unwrap(), b"expansion");

    let typed = manager.read_typed("bg/ex1/02_xyz/b.dat").unwrap();
    assert_eq!(typed.kind(), FileType::Generic);

    assert_eq!(
        manager.loaded(),
        vec![
            ArchiveIdentity::new(Category::Bg, 0, 0),
            ArchiveIdentity::new(Category::Bg, 1, 2),
        ]
    );
}

#[test]
fn test_get_file_returns_owning_pack() {
    let dir = game_dir();
    let manager = PackManager::new(dir.path()).unwrap();

    let (pack, entry) = manager.get_file("bg/ex1/02_xyz/b.dat").unwrap();
    assert_eq!(pack.identity(), ArchiveIdentity::new(Category::Bg, 1, 2));
    assert_eq!(pack.read_payload(&entry).unwrap(), b"expansion");
}

#[test]
fn test_pack_opened_once() {
    let dir = game_dir();
    let manager = PackManager::new(dir.path()).unwrap();

    let packs: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| manager.get_pack("bg/ffxiv/a.dat").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for pack in &packs[1..] {
        assert!(Arc::ptr_eq(&packs[0], pack));
    }
    assert_eq!(manager.loaded().len(), 1);
}

#[test]
fn test_errors() {
    let dir = game_dir();
    let manager = PackManager::new(dir.path()).unwrap();

    assert!(matches!(
        manager.read_file("bg/ffxiv/missing.dat"),
        Err(Error::FileNotFound(_))
    ));
    assert!(matches!(manager.read_file("nothing/here"), Err(Error::Common(_))));

    let missing = dir.path().join("not-there");
    assert!(matches!(PackManager::new(missing), Err(Error::Io(_))));
}

#[test]
fn test_residency_applies_to_loaded_packs() {
    let dir = game_dir();
    let manager = PackManager::with_options(dir.path(), PackOptions::new().resident()).unwrap();
    assert_eq!(manager.options().residency, Residency::Resident);

    let expected = payload(0x2000, 1);
    assert_eq!(manager.read_file("bg/ffxiv/a.dat").unwrap(), expected);
    let pack = manager.get_pack("bg/ffxiv/a.dat").unwrap();
    assert!(pack.containers().is_loaded(0));

    manager.set_residency(Residency::Streamed);
    assert_eq!(pack.residency(), Residency::Streamed);
    assert!(!pack.containers().is_loaded(0));
    assert_eq!(manager.read_file("bg/ffxiv/a.dat").unwrap(), expected);
}

#[test]
fn test_residency_applies_to_later_packs() {
    let dir = game_dir();
    let manager = PackManager::with_options(dir.path(), PackOptions::new().resident()).unwrap();
    manager.read_file("bg/ffxiv/a.dat").unwrap();

    manager.set_residency(Residency::Streamed);
    assert_eq!(manager.options().residency, Residency::Streamed);

    let later = manager.get_pack("bg/ex1/02_xyz/b.dat").unwrap();
    assert_eq!(later.residency(), Residency::Streamed);
    assert_eq!(manager.read_file("bg/ex1/02_xyz/b.dat").unwrap(), b"expansion");
    assert!(!later.containers().is_loaded(0));
}
