use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file or directory")]
    NotFound,
    #[error("file exists")]
    AlreadyExists,
    #[error("directory is full")]
    DirectoryFull,
    #[error("not enough free {0}")]
    InsufficientSpace(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("offset is past the end of the file")]
    OffsetOutOfRange,
    #[error("files larger than {} bytes are not supported", crate::config::MAX_FILE_SIZE)]
    FileTooLarge,
    #[error("is a directory")]
    IsADirectory,
    #[error("not a directory")]
    NotADirectory,
    #[error("directory not empty")]
    NotEmpty,
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    #[error("invalid file name")]
    InvalidFileName,
    #[error("superblock is missing or does not match this file system")]
    InvalidSuperBlock,
    #[error("inode record is corrupted")]
    InvalidInode,
    #[error("directory block {0} is corrupted")]
    CorruptDirectory(u32),
    #[error("device has {0} blocks, at least {} are required", crate::config::MAX_BLOCKS)]
    DeviceTooSmall(usize),
    #[error("index {0} is out of bounds")]
    OutOfBounds(usize),
    #[error("block id {0} is out of range")]
    InvalidBlockId(usize),
    #[error("disk image i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}: command not found")]
    UnknownCommand(String),
}

pub type Result<T> = core::result::Result<T, FsError>;
