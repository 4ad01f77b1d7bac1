//! Virtual file handle: the object returned by `Session::open`.
//!
//! A handle exclusively borrows its session for the duration of its
//! scope. That borrow is what enforces the "no concurrent handle on any
//! file" rule at the type level (see `Session::open`); `Error::FileBusy`
//! exists in the error taxonomy but this design never constructs it.

use crate::error::{Error, Result};
use crate::model::Lookup;
use crate::path::VirtualPath;
use crate::session::Session;

/// Byte offset origin for `seek`, mirroring `SEEK_SET`/`SEEK_CUR`/`SEEK_END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Start,
    Current,
    End,
}

/// The parsed `r w a + b t` mode-character set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeFlags {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub plus: bool,
    pub binary: bool,
    pub text: bool,
}

impl ModeFlags {
    pub fn parse(mode: &str) -> Self {
        let mut flags = ModeFlags::default();
        for c in mode.chars() {
            match c {
                'r' => flags.read = true,
                'w' => flags.write = true,
                'a' => {
                    flags.write = true;
                    flags.append = true;
                }
                '+' => flags.plus = true,
                'b' => flags.binary = true,
                't' => flags.text = true,
                _ => {}
            }
        }
        if !flags.binary && !flags.text {
            flags.binary = true;
        }
        flags
    }

    pub fn readable(&self) -> bool {
        self.read || self.plus
    }

    pub fn writable(&self) -> bool {
        self.write || self.append || self.plus
    }

    fn truncates_on_open(&self) -> bool {
        self.write && !self.append
    }
}

/// A `t`-mode handle's text encoding. `None` ("none" in the mode string)
/// falls back to raw bytes and rejects text-shaped reads/writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Utf8,
    Utf16,
    None,
}

impl Encoding {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("ascii") => Encoding::Ascii,
            Some("utf-16") => Encoding::Utf16,
            Some("none") => Encoding::None,
            _ => Encoding::Utf8,
        }
    }

    fn encode(&self, s: &str) -> Result<Vec<u8>> {
        match self {
            Encoding::Utf16 => Ok(s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()),
            Encoding::Ascii if !s.is_ascii() => Err(Error::TypeMismatch),
            Encoding::None => Err(Error::TextOnBinaryHandle),
            _ => Ok(s.as_bytes().to_vec()),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        match self {
            Encoding::Utf16 => {
                if bytes.len() % 2 != 0 {
                    return Err(Error::TypeMismatch);
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|_| Error::TypeMismatch)
            }
            Encoding::Ascii => {
                if !bytes.is_ascii() {
                    return Err(Error::TypeMismatch);
                }
                Ok(bytes.iter().map(|&b| b as char).collect())
            }
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| Error::TypeMismatch),
            Encoding::None => Err(Error::TextOnBinaryHandle),
        }
    }
}

/// A scoped, exclusive view of one file's bytes.
pub struct FileHandle<'s> {
    session: &'s mut Session,
    path: VirtualPath,
    flags: ModeFlags,
    encoding: Encoding,
    buffer: Vec<u8>,
    cursor: usize,
    dirty: bool,
    closed: bool,
}

impl<'s> FileHandle<'s> {
    pub(crate) fn open(session: &'s mut Session, path: VirtualPath, mode: &str, encoding: Option<&str>) -> Result<Self> {
        let flags = ModeFlags::parse(mode);
        let enc = Encoding::parse(encoding);

        let (read_only, system, mut buffer) = match session.tree.lookup(&path)? {
            Lookup::File(f) => (f.read_only, f.system, f.data.clone()),
            Lookup::Directory(_) | Lookup::Drive => return Err(Error::NotADirectory),
        };

        if flags.writable() && read_only {
            return Err(Error::NotWritable);
        }
        if flags.writable() && system {
            return Err(Error::SystemFileProtected);
        }

        if flags.truncates_on_open() {
            buffer.clear();
        }
        let cursor = if flags.append { buffer.len() } else { 0 };

        log::debug!("opened handle on {path} (mode {mode:?})");
        Ok(FileHandle {
            session,
            path,
            flags,
            encoding: enc,
            buffer,
            cursor,
            dirty: false,
            closed: false,
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::HandleClosed)
        } else {
            Ok(())
        }
    }

    /// Reads up to `n` bytes (or the rest, when `n` is `None`) from the
    /// cursor.
    pub fn read(&mut self, n: Option<usize>) -> Result<Vec<u8>> {
        self.check_open()?;
        if !self.flags.readable() {
            return Err(Error::NotReadable);
        }
        if self.flags.text {
            return Err(Error::TextOnBinaryHandle);
        }
        let remaining = self.buffer.len().saturating_sub(self.cursor);
        let take = n.unwrap_or(remaining).min(remaining);
        let out = self.buffer[self.cursor..self.cursor + take].to_vec();
        self.cursor += take;
        Ok(out)
    }

    /// Reads up to `n` chars worth of bytes (or the rest) and decodes
    /// them per the handle's encoding.
    pub fn read_text(&mut self, n: Option<usize>) -> Result<String> {
        self.check_open()?;
        if !self.flags.readable() {
            return Err(Error::NotReadable);
        }
        if self.flags.binary {
            return Err(Error::TextOnBinaryHandle);
        }
        let remaining = self.buffer.len().saturating_sub(self.cursor);
        let take = n.unwrap_or(remaining).min(remaining);
        let bytes = self.buffer[self.cursor..self.cursor + take].to_vec();
        self.cursor += take;
        self.encoding.decode(&bytes)
    }

    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.check_open()?;
        if !self.flags.writable() {
            return Err(Error::NotWritable);
        }
        if self.flags.text {
            return Err(Error::TypeMismatch);
        }
        self.write_raw(data);
        Ok(())
    }

    pub fn write_text(&mut self, s: &str) -> Result<()> {
        self.check_open()?;
        if !self.flags.writable() {
            return Err(Error::NotWritable);
        }
        if self.flags.binary {
            return Err(Error::TypeMismatch);
        }
        let bytes = self.encoding.encode(s)?;
        self.write_raw(&bytes);
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) {
        self.dirty = true;
        if self.flags.append {
            self.buffer.extend_from_slice(data);
            self.cursor = self.buffer.len();
            return;
        }
        let end = self.cursor + data.len();
        if end > self.buffer.len() {
            self.buffer.resize(end, 0);
        }
        self.buffer[self.cursor..end].copy_from_slice(data);
        self.cursor = end;
    }

    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        self.check_open()?;
        let base = match whence {
            Whence::Start => 0i64,
            Whence::Current => self.cursor as i64,
            Whence::End => self.buffer.len() as i64,
        };
        let new_pos = (base + offset).max(0) as usize;
        self.cursor = new_pos;
        Ok(new_pos as u64)
    }

    pub fn tell(&self) -> Result<u64> {
        self.check_open()?;
        Ok(self.cursor as u64)
    }

    pub fn truncate(&mut self, size: Option<usize>) -> Result<()> {
        self.check_open()?;
        if !self.flags.writable() {
            return Err(Error::NotWritable);
        }
        let new_len = size.unwrap_or(self.cursor);
        self.buffer.resize(new_len, 0);
        self.cursor = self.cursor.min(self.buffer.len());
        self.dirty = true;
        Ok(())
    }

    /// Writes the in-memory buffer back into the tree node.
    pub fn flush(&mut self) -> Result<()> {
        self.check_open()?;
        if self.dirty {
            self.session.tree.file_mut(&self.path)?.data = self.buffer.clone();
            self.dirty = false;
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush()?;
        self.closed = true;
        Ok(())
    }
}

impl<'s> Drop for FileHandle<'s> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                log::error!("error while closing file handle on {}: {e}", self.path);
            }
        }
    }
}
