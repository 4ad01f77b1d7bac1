//! Top-level container codec: ties the header, drive/directory/file
//! tables, and data region together into a single
//! `decode`/`encode` pair.

use crate::bits::{DirAttrByte, DriveByte, DriveCountByte, FileAttrByte};
use crate::error::{CodecError, Result};
use crate::header::{Header, Version};
use crate::payload::{self, Compressor};
use crate::records::{
    DirectoryRecord, DriveRecord, FileRecord, U24, DRIVE_ALPHABET, MAX_DIRECTORY_ID, MIN_DIRECTORY_ID,
};
use binrw::{BinRead, BinWrite};

const MAX_DRIVES: usize = 16;
const MAX_DIRS: usize = 0x7FFF;
const MAX_FILES: usize = 0x00FF_FFFF;

/// The drive/directory/file tables as they sit on the wire, directly
/// after the header. Each table is a count prefix (itself sometimes a
/// sub-byte field) followed by that many fixed- or variable-length
/// records; `binrw` threads the just-read count into the following
/// `Vec`'s `#[br(count = ...)]`.
#[derive(BinRead, BinWrite, Debug)]
#[brw(big)]
struct RawTables {
    #[bw(calc = DriveCountByte::new().with_count(drives.len() as u8))]
    drive_count_byte: DriveCountByte,
    #[br(count = drive_count_byte.count() as usize)]
    drives: Vec<DriveByte>,
    #[bw(calc = directories.len() as u16)]
    dir_count: u16,
    #[br(count = dir_count as usize)]
    directories: Vec<DirectoryRecordWire>,
    #[bw(calc = U24(files.len() as u32))]
    file_count: U24,
    #[br(count = file_count.0 as usize)]
    files: Vec<FileRecordWire>,
}

#[derive(BinRead, BinWrite, Debug)]
#[brw(big)]
struct DirectoryRecordWire {
    id: u16,
    #[bw(calc = name.len() as u8)]
    name_len: u8,
    #[br(count = name_len as usize)]
    name: Vec<u8>,
    attr: DirAttrByte,
    parent_id: u16,
}

#[derive(BinRead, BinWrite, Debug)]
#[brw(big)]
struct FileRecordWire {
    #[bw(calc = name.len() as u8)]
    name_len: u8,
    #[br(count = name_len as usize)]
    name: Vec<u8>,
    attr: FileAttrByte,
    parent_id: u16,
    offset: u64,
    size: u64,
}

/// A fully decoded container, still in flat-record form. The `pfs` crate's
/// tree reconstructor consumes this to build the in-memory model.
#[derive(Debug, Clone)]
pub struct RawContainer {
    pub header: Header,
    pub drives: Vec<DriveRecord>,
    pub directories: Vec<DirectoryRecord>,
    pub files: Vec<FileRecord>,
    pub data: Vec<u8>,
}

impl RawContainer {
    pub fn decode(bytes: &[u8], compressor: Option<&dyn Compressor>) -> Result<Self> {
        let mut cur = std::io::Cursor::new(bytes);
        let header = Header::decode(&mut cur)?;
        let tables = RawTables::read(&mut cur).map_err(CodecError::BinRW)?;

        let mut drives = Vec::with_capacity(tables.drives.len());
        for b in &tables.drives {
            let idx = b.name_index() as usize;
            let name = *DRIVE_ALPHABET
                .get(idx)
                .ok_or(CodecError::Truncated {
                    field: "drive name index",
                    offset: cur.position() as usize,
                })?;
            drives.push(DriveRecord { name, id: b.id() });
        }

        let mut directories = Vec::with_capacity(tables.directories.len());
        for dir in &tables.directories {
            if dir.id <= 0x000F || dir.id > MAX_DIRECTORY_ID {
                return Err(CodecError::BadDirectoryId(dir.id));
            }
            let name = std::str::from_utf8(&dir.name)
                .map_err(|_| CodecError::Truncated {
                    field: "directory name",
                    offset: cur.position() as usize,
                })?
                .to_string();
            directories.push(DirectoryRecord {
                id: dir.id,
                name,
                hidden: dir.attr.hidden(),
                parent_id: dir.parent_id,
            });
        }

        let mut files = Vec::with_capacity(tables.files.len());
        for file in &tables.files {
            let name = std::str::from_utf8(&file.name)
                .map_err(|_| CodecError::Truncated {
                    field: "file name",
                    offset: cur.position() as usize,
                })?
                .to_string();
            files.push(FileRecord {
                name,
                read_only: file.attr.read_only(),
                hidden: file.attr.hidden(),
                system: file.attr.system(),
                parent_id: file.parent_id,
                offset: file.offset,
                size: file.size,
            });
        }

        let required = payload::required_len(files.iter().map(|f| (f.offset, f.size)));
        let (compressed, level) = header.compression.unwrap_or((false, 0));
        let _ = level;
        let data_start = cur.position() as usize;
        let raw_data = &bytes[data_start..];
        let data = payload::decode(raw_data, compressed, compressor, required)?;

        Ok(RawContainer {
            header,
            drives,
            directories,
            files,
            data,
        })
    }

    pub fn encode(&self, compressor: Option<&dyn Compressor>) -> Result<Vec<u8>> {
        if self.drives.len() > MAX_DRIVES {
            return Err(CodecError::TooManyDrives(self.drives.len()));
        }
        if self.directories.len() > MAX_DIRS {
            return Err(CodecError::TooManyDirs(self.directories.len()));
        }
        if self.files.len() > MAX_FILES {
            return Err(CodecError::TooManyFiles(self.files.len()));
        }
        for dir in &self.directories {
            if dir.id <= 0x000F || dir.id > MAX_DIRECTORY_ID {
                return Err(CodecError::DirIdOverflow(dir.id as usize));
            }
        }

        let mut cur = std::io::Cursor::new(Vec::new());
        self.header.encode(&mut cur)?;

        let drives: Vec<DriveByte> = self
            .drives
            .iter()
            .map(|drive| {
                let idx = DRIVE_ALPHABET
                    .iter()
                    .position(|&b| b == drive.name)
                    .unwrap_or(0) as u8;
                DriveByte::new().with_name_index(idx).with_id(drive.id)
            })
            .collect();

        let mut directories = Vec::with_capacity(self.directories.len());
        for dir in &self.directories {
            let name_bytes = dir.name.as_bytes();
            if name_bytes.len() > u8::MAX as usize {
                return Err(CodecError::NameTooLong);
            }
            directories.push(DirectoryRecordWire {
                id: dir.id,
                name: name_bytes.to_vec(),
                attr: DirAttrByte::new().with_hidden(dir.hidden),
                parent_id: dir.parent_id,
            });
        }

        let mut files = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let name_bytes = file.name.as_bytes();
            if name_bytes.len() > u8::MAX as usize {
                return Err(CodecError::NameTooLong);
            }
            files.push(FileRecordWire {
                name: name_bytes.to_vec(),
                attr: FileAttrByte::new()
                    .with_read_only(file.read_only)
                    .with_hidden(file.hidden)
                    .with_system(file.system),
                parent_id: file.parent_id,
                offset: file.offset,
                size: file.size,
            });
        }

        let tables = RawTables {
            drive_count_byte: DriveCountByte::new().with_count(drives.len() as u8),
            drives,
            dir_count: directories.len() as u16,
            directories,
            file_count: U24(files.len() as u32),
            files,
        };
        tables.write(&mut cur).map_err(CodecError::BinRW)?;

        let (compressed, level) = self.header.compression.unwrap_or((false, 0));
        let data = payload::encode(&self.data, compressed, level, compressor)?;

        let mut out = cur.into_inner();
        out.extend_from_slice(&data);
        Ok(out)
    }
}

pub fn is_drive_root_parent(parent_id: u16) -> bool {
    parent_id < MIN_DIRECTORY_ID
}
