use thiserror::Error;

/// Errors raised while decoding or encoding a raw `.pfs` container.
///
/// These are the format- and encoding-level failures; path- and
/// lifecycle-level errors live one layer up, in the `pfs` crate, which
/// wraps this type via `#[from]`.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unexpected end of input at byte offset {0}")]
    Eof(usize),
    #[error("bad magic bytes, expected 'pfs0'")]
    BadMagic,
    #[error("unsupported container version byte {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("input truncated while reading {field} at offset {offset}")]
    Truncated { field: &'static str, offset: usize },
    #[error("directory id {0:#06x} is out of the valid [0x10, 0x7FFF] range")]
    BadDirectoryId(u16),
    #[error("data region is {actual} bytes, but file table requires at least {required}")]
    PayloadTooShort { required: u64, actual: u64 },
    #[error("directory/file parent references do not resolve (orphan or cycle)")]
    OrphanOrCycle,
    #[error("container name is longer than 13 utf-8 bytes")]
    NameTooLong,
    #[error("file count {0} exceeds the 24-bit field width")]
    TooManyFiles(usize),
    #[error("directory count {0} exceeds the 15-bit field width")]
    TooManyDirs(usize),
    #[error("drive count {0} exceeds the 4-bit field width")]
    TooManyDrives(usize),
    #[error("directory id {0} exceeds the 15-bit field width")]
    DirIdOverflow(usize),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("binary read/write error: {0}")]
    BinRW(#[from] binrw::Error),
    #[error("compression error: {0}")]
    Compression(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
