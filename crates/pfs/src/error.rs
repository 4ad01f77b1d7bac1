use thiserror::Error;

/// Errors surfaced by the public session/path/handle API.
///
/// Format- and encoding-level failures are produced one layer down, in
/// `pfs_codec::CodecError`, and folded in here via `#[from]` rather than
/// re-declared.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] pfs_codec::CodecError),

    // Path errors
    #[error("no such path")]
    NoSuchPath,
    #[error("parent directory does not exist")]
    NoSuchParent,
    #[error("a child with that name already exists")]
    NameTaken,
    #[error("not a directory")]
    NotADirectory,
    #[error("path is a drive root and has no parent")]
    NoParent,
    #[error("'..' would ascend above the drive root")]
    EscapesRoot,
    #[error("path names a drive root, which this operation does not accept")]
    IsDrive,
    #[error("drive name must be a single letter in A..P")]
    BadDriveName,
    #[error("a drive with that name or id already exists")]
    DriveExists,
    #[error("maximum of 16 drives already present")]
    TooManyDrives,
    #[error("no such drive")]
    NoSuchDrive,
    #[error("file carries the system attribute and cannot be removed")]
    IsSystemFile,

    // I/O errors
    #[error("handle is not readable")]
    NotReadable,
    #[error("handle is not writable")]
    NotWritable,
    #[error("operand type does not match the handle's text/binary mode")]
    TypeMismatch,
    #[error("handle is in text mode; binary-only operation requested")]
    TextOnBinaryHandle,
    #[error("file carries the system attribute and is protected from writes")]
    SystemFileProtected,
    #[error("a handle is already open on this file")]
    FileBusy,

    // Lifecycle
    #[error("session is closed")]
    SessionClosed,
    #[error("handle is closed")]
    HandleClosed,

    // Attribute
    #[error("attribute does not apply to this kind of entity")]
    AttrNotApplicable,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
