//! Fixed-prefix header fields: magic, version, optional compression
//! byte, and the padded container name.

use crate::bits::CompressionByte;
use crate::error::{CodecError, Result};
use binrw::{BinRead, BinWrite};

pub const MAGIC: &[u8; 4] = b"pfs0";
pub const MAX_NAME_BYTES: usize = 13;

/// The fixed-layout prefix of the header, as it sits on the wire: magic,
/// version byte, the v2-only compression byte, and the padded name.
/// `Header` itself is the validated, already-unpacked form callers use.
#[derive(BinRead, BinWrite, Debug)]
#[brw(big, magic(b"pfs0"))]
struct RawHeaderFixed {
    version_byte: u8,
    #[br(if(version_byte == 1))]
    #[bw(if(compression.is_some()))]
    compression: Option<CompressionByte>,
    name: [u8; MAX_NAME_BYTES],
}

/// Container format version. `V1` lacks the compression byte and the
/// file-attribute `system` bit; `V2` is the canonical target and is what
/// encoders emit by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V1,
    V2,
}

impl Version {
    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0x00 => Ok(Version::V1),
            0x01 => Ok(Version::V2),
            other => Err(CodecError::UnsupportedVersion(other)),
        }
    }

    fn to_byte(self) -> u8 {
        match self {
            Version::V1 => 0x00,
            Version::V2 => 0x01,
        }
    }
}

/// Parsed fixed-prefix header, decoded but not yet validated against the
/// tables that follow it.
#[derive(Debug, Clone)]
pub struct Header {
    pub version: Version,
    /// `(compressed, level)`, only ever `Some` for `V2`.
    pub compression: Option<(bool, u8)>,
    pub name: String,
}

impl Header {
    pub fn decode<R: std::io::Read + std::io::Seek>(r: &mut R) -> Result<Self> {
        let raw = RawHeaderFixed::read(r).map_err(|e| match e {
            binrw::Error::BadMagic { .. } => CodecError::BadMagic,
            other => CodecError::BinRW(other),
        })?;

        let version = Version::from_byte(raw.version_byte)?;
        let compression = raw.compression.map(|byte| (byte.compressed(), byte.level()));

        let name_end = raw
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(raw.name.len());
        let name = std::str::from_utf8(&raw.name[..name_end])
            .map_err(|_| CodecError::Truncated {
                field: "container name",
                offset: r.stream_position().unwrap_or(0) as usize,
            })?
            .to_string();

        Ok(Header {
            version,
            compression,
            name,
        })
    }

    pub fn encode<W: std::io::Write + std::io::Seek>(&self, w: &mut W) -> Result<()> {
        let name_bytes = self.name.as_bytes();
        if name_bytes.len() > MAX_NAME_BYTES {
            return Err(CodecError::NameTooLong);
        }
        let mut name = [0u8; MAX_NAME_BYTES];
        name[..name_bytes.len()].copy_from_slice(name_bytes);

        let compression = match self.version {
            Version::V2 => {
                let (compressed, level) = self.compression.unwrap_or((false, 0));
                Some(CompressionByte::new().with_compressed(compressed).with_level(level))
            }
            Version::V1 => None,
        };

        let raw = RawHeaderFixed {
            version_byte: self.version.to_byte(),
            compression,
            name,
        };
        raw.write(w).map_err(CodecError::BinRW)?;

        Ok(())
    }
}
