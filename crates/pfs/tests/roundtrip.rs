//! End-to-end coverage of the load -> mutate -> save -> reload cycle,
//! including the literal scenarios enumerated for this container format.

use pfs::{Attr, Session};

#[test]
fn scenario_write_save_reopen_read_back() {
    let mut session = Session::new("demo", &[b'A']).unwrap();
    let path = session.resolve("A:/a.txt").unwrap();
    session.touch(&path).unwrap();
    {
        let mut handle = session.open(&path, "wb", None).unwrap();
        handle.write(b"hi").unwrap();
    }
    let bytes = session.save(None, Some(false), None).unwrap().unwrap();

    let mut reopened = Session::open_bytes(&bytes).unwrap();
    let reopened_path = reopened.resolve("A:/a.txt").unwrap();
    let mut handle = reopened.open(&reopened_path, "rb", None).unwrap();
    assert_eq!(handle.read(None).unwrap(), b"hi");
}

#[test]
fn scenario_nested_mkdir_iterdir_single_child() {
    let mut session = Session::new("d", &[b'A']).unwrap();
    let x = session.resolve("A:/x").unwrap();
    session.mkdir(&x).unwrap();
    let y = session.resolve("A:/x/y").unwrap();
    session.mkdir(&y).unwrap();
    let z = session.resolve("A:/x/y/z").unwrap();
    session.touch(&z).unwrap();

    let listing = session.iterdir(&y).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name(), Some("z"));
}

#[test]
fn scenario_bad_magic_blob() {
    let blob = pfs_tests::bad_magic();
    let err = Session::open_bytes(&blob).unwrap_err();
    assert!(matches!(err, pfs::Error::Codec(pfs_codec::CodecError::BadMagic)));
}

#[test]
fn scenario_orphan_directory_stalls_and_fails() {
    let blob = pfs_tests::orphan_directory_v2();
    let err = Session::open_bytes(&blob).unwrap_err();
    assert!(matches!(err, pfs::Error::Codec(pfs_codec::CodecError::OrphanOrCycle)));
}

#[test]
fn scenario_read_only_file_rejects_write_open() {
    let blob = pfs_tests::read_only_file_v2();
    let mut session = Session::open_bytes(&blob).unwrap();
    let path = session.resolve("A:/s").unwrap();
    let err = session.open(&path, "w", None).unwrap_err();
    assert!(matches!(err, pfs::Error::NotWritable));
}

#[test]
fn scenario_compressed_save_reduces_size_and_roundtrips() {
    let mut session = Session::new("compTest", &[b'A']).unwrap();
    let path = session.resolve("A:/big.bin").unwrap();
    session.touch(&path).unwrap();
    let payload = vec![0u8; 100 * 1024];
    {
        let mut handle = session.open(&path, "wb", None).unwrap();
        handle.write(&payload).unwrap();
    }

    let raw_bytes = session.save(None, Some(false), None).unwrap().unwrap();
    let compressed_bytes = session.save(None, Some(true), Some(10)).unwrap().unwrap();
    assert!(compressed_bytes.len() < raw_bytes.len());

    let mut reopened = Session::open_bytes(&compressed_bytes).unwrap();
    let reopened_path = reopened.resolve("A:/big.bin").unwrap();
    let mut handle = reopened.open(&reopened_path, "rb", None).unwrap();
    assert_eq!(handle.read(None).unwrap(), payload);
}

#[test]
fn invariant_mkdir_then_unlink_restores_tree() {
    let mut session = Session::new("demo", &[b'A']).unwrap();
    let before = session.save(None, Some(false), None).unwrap().unwrap();

    let path = session.resolve("A:/x").unwrap();
    session.mkdir(&path).unwrap();
    session.unlink(&path).unwrap();

    let after = session.save(None, Some(false), None).unwrap().unwrap();
    assert_eq!(before, after);
}

#[test]
fn invariant_no_duplicate_names_under_one_parent() {
    let mut session = Session::new("demo", &[b'A']).unwrap();
    let path = session.resolve("A:/a.txt").unwrap();
    session.touch(&path).unwrap();
    assert!(session.touch(&path).is_err());
    session.mkdir(&path).unwrap_err();
}

#[test]
fn boundary_zero_drives_permits_new_and_save_but_not_path() {
    let mut session = Session::new("empty", &[]).unwrap();
    assert!(session.save(None, Some(false), None).is_ok());
    assert!(session.resolve("A:/x").is_err());
}

#[test]
fn boundary_sixteen_drives_then_toomanydrives() {
    let mut session = Session::new("demo", &[]).unwrap();
    for letter in b'A'..=b'P' {
        session.add_drive(letter).unwrap();
    }
    let err = session.add_drive(b'P').unwrap_err();
    assert!(matches!(err, pfs::Error::TooManyDrives));
}

#[test]
fn boundary_name_exactly_thirteen_bytes_accepted() {
    let session = Session::new("1234567890123", &[b'A']).unwrap();
    assert_eq!(session.name(), "1234567890123");
}

#[test]
fn boundary_name_fourteen_bytes_rejected() {
    let err = Session::new("12345678901234", &[b'A']).unwrap_err();
    assert!(matches!(err, pfs::Error::Codec(pfs_codec::CodecError::NameTooLong)));
}

#[test]
fn boundary_zero_size_file_roundtrips() {
    let mut session = Session::new("demo", &[b'A']).unwrap();
    let path = session.resolve("A:/empty.txt").unwrap();
    session.touch(&path).unwrap();
    let bytes = session.save(None, Some(false), None).unwrap().unwrap();
    let mut reopened = Session::open_bytes(&bytes).unwrap();
    let reopened_path = reopened.resolve("A:/empty.txt").unwrap();
    let mut handle = reopened.open(&reopened_path, "rb", None).unwrap();
    assert_eq!(handle.read(None).unwrap(), Vec::<u8>::new());
}

#[test]
fn attribute_read_only_not_applicable_to_directories() {
    let mut session = Session::new("demo", &[b'A']).unwrap();
    let path = session.resolve("A:/x").unwrap();
    session.mkdir(&path).unwrap();
    let err = session.get_attr(&path, Attr::ReadOnly).unwrap_err();
    assert!(matches!(err, pfs::Error::AttrNotApplicable));
}

#[test]
fn open_then_close_then_session_closed_error() {
    let mut session = Session::new("demo", &[b'A']).unwrap();
    session.close().unwrap();
    assert!(session.resolve("A:/x").is_err());
}
