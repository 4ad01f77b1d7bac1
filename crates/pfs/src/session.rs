//! Session lifecycle: the single owner of the in-memory tree, and the
//! entry point every path/handle operation is ultimately routed through.

use crate::error::{Error, Result};
use crate::flatten;
use crate::handle::FileHandle;
use crate::model::{Attr, Tree};
use crate::path::{ParsedPath, VirtualPath};
use crate::tree;
use pfs_codec::header::{Header, Version, MAX_NAME_BYTES};
use pfs_codec::payload::Compressor;
use pfs_codec::RawContainer;
use std::path::{Path as StdPath, PathBuf};

/// Compression applied to the data region on `save`. `level` is only
/// meaningful when `enabled` is set; the contract (`Compressor`) accepts
/// any level in `1..=22`, with `10` as the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub level: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        CompressionConfig {
            enabled: false,
            level: 10,
        }
    }
}

/// An in-memory PortableFS container and the sole owner of its tree.
pub struct Session {
    pub(crate) tree: Tree,
    cwd: VirtualPath,
    name: String,
    version: Version,
    pub compression: CompressionConfig,
    closed: bool,
    loaded_from_source: bool,
    source_path: Option<PathBuf>,
    pub autosave: bool,
}

fn default_compressor() -> Option<Box<dyn Compressor>> {
    #[cfg(feature = "zstd")]
    {
        Some(Box::new(pfs_codec::payload::ZstdCompressor))
    }
    #[cfg(not(feature = "zstd"))]
    {
        None
    }
}

impl Session {
    /// Creates a fresh, empty container named `name` with one drive per
    /// entry in `drives` (each a single `A..P` letter).
    pub fn new(name: &str, drives: &[u8]) -> Result<Self> {
        if name.as_bytes().len() > MAX_NAME_BYTES {
            return Err(Error::Codec(pfs_codec::CodecError::NameTooLong));
        }
        let mut tree = Tree::new();
        for &letter in drives {
            tree.add_drive(letter)?;
        }
        let cwd = drives
            .first()
            .map(|&d| VirtualPath::drive_root(d))
            .unwrap_or(VirtualPath { drive: 0, segments: Vec::new() });

        log::info!("created new session '{name}' with {} drive(s)", drives.len());
        Ok(Session {
            tree,
            cwd,
            name: name.to_string(),
            version: Version::V2,
            compression: CompressionConfig::default(),
            closed: false,
            loaded_from_source: false,
            source_path: None,
            autosave: false,
        })
    }

    /// Decodes a session from an in-memory blob.
    pub fn open_bytes(bytes: &[u8]) -> Result<Self> {
        let compressor = default_compressor();
        let container = RawContainer::decode(bytes, compressor.as_deref())?;
        Self::from_container(container, None)
    }

    /// Decodes a session from a `.pfs` file on the host filesystem.
    /// Subsequent autosave-on-close writes back to this same path.
    pub fn open_path(path: impl AsRef<StdPath>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let compressor = default_compressor();
        let container = RawContainer::decode(&bytes, compressor.as_deref())?;
        Self::from_container(container, Some(path.to_path_buf()))
    }

    fn from_container(container: RawContainer, source_path: Option<PathBuf>) -> Result<Self> {
        let version = container.header.version;
        let name = container.header.name.clone();
        let compression = CompressionConfig {
            enabled: container.header.compression.map(|(c, _)| c).unwrap_or(false),
            level: container.header.compression.map(|(_, l)| l).unwrap_or(10),
        };
        let tree = tree::build(&container)?;
        let cwd = tree
            .drives
            .first()
            .map(|d| VirtualPath::drive_root(d.name))
            .unwrap_or(VirtualPath { drive: 0, segments: Vec::new() });

        log::info!("opened session '{name}' ({} drive(s))", tree.drives.len());
        Ok(Session {
            tree,
            cwd,
            name,
            version,
            compression,
            closed: false,
            loaded_from_source: true,
            source_path,
            autosave: false,
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::SessionClosed)
        } else {
            Ok(())
        }
    }

    /// Parses `s` and resolves it against the current working drive/path,
    /// normalizing `.`/`..`. Fails `NoSuchDrive` if the named (or current)
    /// drive does not exist in this session.
    pub fn resolve(&self, s: &str) -> Result<VirtualPath> {
        self.check_open()?;
        let parsed: ParsedPath = s.parse()?;
        let refs: Vec<&str> = parsed.segments.iter().map(String::as_str).collect();
        let absolute = match parsed.drive {
            Some(drive) => VirtualPath {
                drive,
                segments: parsed.segments,
            },
            None => self.cwd.joinpath(&refs),
        };
        if !self.tree.drives.iter().any(|d| d.name == absolute.drive) {
            return Err(Error::NoSuchDrive);
        }
        absolute.resolve()
    }

    pub fn exists(&self, path: &VirtualPath) -> Result<bool> {
        self.check_open()?;
        Ok(self.tree.exists(path))
    }

    pub fn is_file(&self, path: &VirtualPath) -> Result<bool> {
        self.check_open()?;
        Ok(matches!(self.tree.lookup(path), Ok(crate::model::Lookup::File(_))))
    }

    pub fn is_dir(&self, path: &VirtualPath) -> Result<bool> {
        self.check_open()?;
        Ok(matches!(
            self.tree.lookup(path),
            Ok(crate::model::Lookup::Directory(_)) | Ok(crate::model::Lookup::Drive)
        ))
    }

    pub fn is_drive(&self, path: &VirtualPath) -> Result<bool> {
        self.check_open()?;
        Ok(path.is_drive_root() && self.tree.exists(path))
    }

    pub fn iterdir(&self, path: &VirtualPath) -> Result<Vec<VirtualPath>> {
        self.check_open()?;
        self.tree.iterdir(path)
    }

    pub fn add_drive(&mut self, letter: u8) -> Result<()> {
        self.check_open()?;
        self.tree.add_drive(letter)
    }

    pub fn remove_drive(&mut self, letter: u8) -> Result<()> {
        self.check_open()?;
        self.tree.remove_drive(letter)
    }

    pub fn mkdir(&mut self, path: &VirtualPath) -> Result<()> {
        self.check_open()?;
        if path.is_drive_root() {
            return Err(Error::IsDrive);
        }
        log::debug!("mkdir {path}");
        self.tree.mkdir(path)
    }

    pub fn touch(&mut self, path: &VirtualPath) -> Result<()> {
        self.check_open()?;
        if path.is_drive_root() {
            return Err(Error::IsDrive);
        }
        log::debug!("touch {path}");
        self.tree.touch(path)
    }

    pub fn unlink(&mut self, path: &VirtualPath) -> Result<()> {
        self.check_open()?;
        if path.is_drive_root() {
            return Err(Error::IsDrive);
        }
        log::debug!("unlink {path}");
        self.tree.unlink(path)
    }

    pub fn get_attr(&self, path: &VirtualPath, attr: Attr) -> Result<bool> {
        self.check_open()?;
        self.tree.get_attr(path, attr)
    }

    pub fn set_attr(&mut self, path: &VirtualPath, attr: Attr, value: bool) -> Result<()> {
        self.check_open()?;
        self.tree.set_attr(path, attr, value)
    }

    /// Opens a file handle. The returned handle exclusively borrows this
    /// session for its scope, which is what rules out a second concurrent
    /// handle on any file without a runtime `FileBusy` check: the borrow
    /// checker already refuses to hand out a second `&mut Session` while
    /// the first handle is alive.
    pub fn open<'s>(&'s mut self, path: &VirtualPath, mode: &str, encoding: Option<&str>) -> Result<FileHandle<'s>> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        FileHandle::open(self, path.clone(), mode, encoding)
    }

    /// Re-serializes the entire tree. Writes to `target` when given,
    /// otherwise returns the encoded bytes.
    pub fn save(&mut self, target: Option<&StdPath>, compress: Option<bool>, level: Option<u8>) -> Result<Option<Vec<u8>>> {
        self.check_open()?;
        let compressed = compress.unwrap_or(self.compression.enabled);
        let lvl = level.unwrap_or(self.compression.level);

        let flat = flatten::flatten(&self.tree);
        let has_system_file = flat.files.iter().any(|f| f.system);
        let version = if self.version == Version::V1 && (compressed || has_system_file) {
            Version::V2
        } else {
            self.version
        };
        let header = Header {
            version,
            compression: matches!(version, Version::V2).then_some((compressed, lvl)),
            name: self.name.clone(),
        };
        let container = RawContainer {
            header,
            drives: flat.drives,
            directories: flat.directories,
            files: flat.files,
            data: flat.data,
        };

        let compressor = default_compressor();
        let bytes = container.encode(compressor.as_deref())?;

        log::info!("saved session '{}' ({} bytes)", self.name, bytes.len());
        match target {
            Some(p) => {
                std::fs::write(p, &bytes)?;
                self.source_path = Some(p.to_path_buf());
                Ok(None)
            }
            None => Ok(Some(bytes)),
        }
    }

    /// Marks the session closed. If autosave is enabled and the session
    /// was opened (not freshly created via `new`) and has a known source
    /// path, saves back to it first. A failing autosave is reported
    /// unless the caller is already unwinding from some other error.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if self.autosave && self.loaded_from_source {
            if let Some(path) = self.source_path.clone() {
                if let Err(e) = self.save(Some(&path), None, None) {
                    log::error!("autosave on close failed for '{}': {e}", self.name);
                    self.closed = true;
                    return Err(e);
                }
            }
        }
        log::info!("closed session '{}'", self.name);
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                log::error!("error while closing session on drop: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_has_cwd_at_first_drive() {
        let session = Session::new("demo", &[b'A', b'B']).unwrap();
        assert_eq!(session.cwd, VirtualPath::drive_root(b'A'));
    }

    #[test]
    fn test_operations_after_close_fail() {
        let mut session = Session::new("demo", &[b'A']).unwrap();
        session.close().unwrap();
        let path = VirtualPath::drive_root(b'A');
        assert!(matches!(session.mkdir(&path), Err(Error::SessionClosed)));
    }

    #[test]
    fn test_resolve_relative_uses_cwd() {
        let session = Session::new("demo", &[b'A']).unwrap();
        let resolved = session.resolve("x/y").unwrap();
        assert_eq!(resolved, VirtualPath::drive_root(b'A').joinpath(&["x", "y"]));
    }

    #[test]
    fn test_name_too_long_rejected() {
        let err = Session::new("fourteen chars", &[b'A']).unwrap_err();
        assert!(matches!(err, Error::Codec(pfs_codec::CodecError::NameTooLong)));
    }
}
