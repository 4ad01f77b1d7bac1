//! In-memory, single-file portable virtual filesystem.
//!
//! Built on top of `pfs-codec`'s container codec: this crate owns the
//! tree reconstructor, the tree mutation API, path parsing and
//! resolution, the virtual file handle, and the session
//! lifecycle, plus a thin host-filesystem bridge.

pub mod error;
pub mod flatten;
pub mod handle;
pub mod hostfs;
pub mod model;
pub mod path;
pub mod session;
pub mod tree;

pub use error::{Error, Result};
pub use handle::{Encoding, FileHandle, Whence};
pub use hostfs::{copy_into, extract};
pub use model::Attr;
pub use path::{ParsedPath, VirtualPath};
pub use session::{CompressionConfig, Session};
