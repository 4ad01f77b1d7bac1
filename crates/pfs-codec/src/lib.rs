//! Binary container codec for PortableFS (`.pfs`) blobs.
//!
//! This crate owns the wire format only: byte/bit cursors, the
//! header and flat drive/directory/file tables, and the data region.
//! It has no notion of a tree, a path, or a session; see the `pfs`
//! crate for those.

pub mod bits;
pub mod container;
pub mod cursor;
pub mod error;
pub mod header;
pub mod payload;
pub mod records;

pub use container::RawContainer;
pub use error::{CodecError, Result};
pub use header::{Header, Version};
pub use payload::Compressor;
pub use records::{DirectoryRecord, DriveRecord, FileRecord};

#[cfg(feature = "zstd")]
pub use payload::ZstdCompressor;
