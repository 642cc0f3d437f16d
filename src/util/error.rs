use std::io;
use std::os::raw::c_int;

use thiserror::Error;

use crate::structure::inode::InodeKind;

type ErrorNum = c_int;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid path '{0}'")]
    InvalidPath(String),
    #[error("directory '{0}' in the provided path doesn't exist")]
    PathSegmentNotFound(String),
    #[error("'{0}' does not exist")]
    NotFound(String),
    #[error("'{name}' is not a {expected}")]
    WrongKind { name: String, expected: InodeKind },
    #[error("'{0}' already exists")]
    AlreadyExists(String),
    #[error("no available inodes")]
    InodeTableExhausted,
    #[error("no available data blocks")]
    BlockPoolExhausted,
    #[error("file size {size} exceeds the limit of {limit} bytes")]
    SizeLimitExceeded { size: u64, limit: u64 },
    #[error("name '{0}' is longer than {max} characters", max = crate::consts::FILE_NAME_LENGTH)]
    NameTooLong(String),
    #[error("directory '{0}' has no room for another entry")]
    DirectoryFull(String),
    #[error("'{0}' and '{1}' are the same file")]
    SameFile(String, String),
    #[error("the store carries no filesystem identifier")]
    NotFormatted,
    #[error("device holds {size} bytes, at least {required} are required")]
    DeviceTooSmall { size: u64, required: u64 },
    #[error("corrupted store: {0}")]
    Corrupted(String),
    #[error("device error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn errno(&self) -> ErrorNum {
        match self {
            Error::InvalidPath(_) | Error::SameFile(..) | Error::NotFormatted => libc::EINVAL,
            Error::PathSegmentNotFound(_) | Error::NotFound(_) => libc::ENOENT,
            Error::WrongKind { expected: InodeKind::Directory, .. } => libc::ENOTDIR,
            Error::WrongKind { expected: InodeKind::File, .. } => libc::EISDIR,
            Error::AlreadyExists(_) => libc::EEXIST,
            Error::InodeTableExhausted | Error::BlockPoolExhausted | Error::DirectoryFull(_) => libc::ENOSPC,
            Error::SizeLimitExceeded { .. } => libc::EFBIG,
            Error::NameTooLong(_) => libc::ENAMETOOLONG,
            Error::DeviceTooSmall { .. } | Error::Corrupted(_) => libc::EIO,
            Error::Io(err) => err.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}
