//! Flat, order-preserving records decoded straight off the wire. These
//! carry no tree structure — see the `pfs` crate's tree reconstructor for
//! that — they are the direct result of parsing the drive/directory/file
//! tables.

use binrw::prelude::*;
use std::io::{Read, Write};

/// A big-endian 3-byte unsigned integer: the wire width of the file
/// table's count prefix, which has no native Rust (or `binrw`) integer
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct U24(pub u32);

impl BinRead for U24 {
    type Args<'a> = ();

    fn read_options<R: Read + std::io::Seek>(
        reader: &mut R,
        _endian: binrw::endian::Endian,
        _args: Self::Args<'_>,
    ) -> binrw::BinResult<Self> {
        let mut b = [0u8; 3];
        reader.read_exact(&mut b)?;
        Ok(U24(u32::from_be_bytes([0, b[0], b[1], b[2]])))
    }
}

impl BinWrite for U24 {
    type Args<'a> = ();

    fn write_options<W: Write + std::io::Seek>(
        &self,
        writer: &mut W,
        _endian: binrw::endian::Endian,
        _args: Self::Args<'_>,
    ) -> binrw::BinResult<()> {
        let b = self.0.to_be_bytes();
        writer.write_all(&b[1..4])?;
        Ok(())
    }
}

/// The alphabet of valid drive letters, in declaration order. A drive's
/// `name_index` in [`crate::bits::DriveByte`] is its position in this
/// slice.
pub const DRIVE_ALPHABET: &[u8; 16] = b"ABCDEFGHIJKLMNOP";

/// Smallest valid directory id. Ids at or below this are drive-root
/// pseudo-parents.
pub const MIN_DIRECTORY_ID: u16 = 0x10;
/// Largest valid directory id (15-bit field width).
pub const MAX_DIRECTORY_ID: u16 = 0x7FFF;

/// A drive root: a single letter and its 4-bit id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveRecord {
    pub name: u8,
    pub id: u8,
}

/// A directory as read straight from the directory table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    pub id: u16,
    pub name: String,
    pub hidden: bool,
    pub parent_id: u16,
}

/// A file as read straight from the file table. `offset`/`size` describe
/// the file's byte range within the (decompressed) data region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub read_only: bool,
    pub hidden: bool,
    pub system: bool,
    pub parent_id: u16,
    pub offset: u64,
    pub size: u64,
}

impl FileRecord {
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}
