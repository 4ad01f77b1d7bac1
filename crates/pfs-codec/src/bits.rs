//! Sub-byte fields of the container format, modeled as `modular_bitfield`
//! structs rather than read-once/reread-differently-aligned bytes. Each
//! struct derives `binrw`'s `BinRead`/`BinWrite` via a byte-array map, so
//! it can be embedded directly as a field in a larger `binrw`-derived
//! struct and costs one ordinary field read on the wire.

use binrw::{BinRead, BinWrite};
use modular_bitfield::prelude::*;

/// The compression byte, present only in v2 headers.
///
/// Bit 7 is the compressed flag; bits 6..0 hold the zstd level (0-127,
/// though the container format only ever uses 1..=22).
#[bitfield]
#[derive(BinRead, BinWrite, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[bw(map = |&x| Self::into_bytes(x))]
#[br(map = Self::from_bytes)]
pub struct CompressionByte {
    pub level: B7,
    pub compressed: bool,
}

/// High nibble = position of the drive's letter in the `A..P` alphabet.
/// Low nibble = the drive's allocated 4-bit id.
#[bitfield]
#[derive(BinRead, BinWrite, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[bw(map = |&x| Self::into_bytes(x))]
#[br(map = Self::from_bytes)]
pub struct DriveByte {
    pub id: B4,
    pub name_index: B4,
}

/// The one-byte nibble pair that opens the drive table: drive count in
/// the high nibble, the low nibble reserved (always zero on write).
#[bitfield]
#[derive(BinRead, BinWrite, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[bw(map = |&x| Self::into_bytes(x))]
#[br(map = Self::from_bytes)]
pub struct DriveCountByte {
    #[skip]
    pub reserved: B4,
    pub count: B4,
}

/// Directory attribute byte. Bit 7 is `hidden`; all other bits are
/// reserved. The older (v1) format uses the same bit position for
/// `hidden` and treats the rest as reserved/zero.
#[bitfield]
#[derive(BinRead, BinWrite, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[bw(map = |&x| Self::into_bytes(x))]
#[br(map = Self::from_bytes)]
pub struct DirAttrByte {
    #[skip]
    pub reserved: B7,
    pub hidden: bool,
}

/// File attribute byte. Bit 7 = `read_only`, bit 6 = `hidden`, bit 5 =
/// `system` (v2 only; v1 writers must leave it zero and v1 files must not
/// set `system`).
#[bitfield]
#[derive(BinRead, BinWrite, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[bw(map = |&x| Self::into_bytes(x))]
#[br(map = Self::from_bytes)]
pub struct FileAttrByte {
    #[skip]
    pub reserved: B5,
    pub system: bool,
    pub hidden: bool,
    pub read_only: bool,
}
