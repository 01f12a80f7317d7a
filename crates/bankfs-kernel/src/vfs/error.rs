//! VFS error types.

use std::io;
use thiserror::Error;

/// VFS error type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VfsError {
    /// File or directory not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Path already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A path segment names a file where a directory was expected.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Content operation on a directory.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Every chunk in the storage pool is in use.
    #[error("no free chunks left in the storage pool")]
    OutOfSpace,

    /// Offset would leave a hole, or lies outside a chunk.
    #[error("invalid offset: {0}")]
    InvalidOffset(String),

    /// Malformed path, or an operation the path shape forbids.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// A path segment is longer than the engine accepts.
    #[error("file name too long: {0}")]
    NameTooLong(String),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(path: impl Into<String>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create an InvalidOffset error.
    pub fn invalid_offset(detail: impl Into<String>) -> Self {
        Self::InvalidOffset(detail.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// The positive errno a FUSE-style collaborator should negate and return.
    pub fn errno(&self) -> i32 {
        match self {
            VfsError::NotFound(_) => libc::ENOENT,
            VfsError::AlreadyExists(_) => libc::EEXIST,
            VfsError::NotADirectory(_) => libc::ENOTDIR,
            VfsError::IsADirectory(_) => libc::EISDIR,
            VfsError::OutOfSpace => libc::ENOSPC,
            VfsError::InvalidOffset(_) | VfsError::InvalidPath(_) => libc::EINVAL,
            VfsError::NameTooLong(_) => libc::ENAMETOOLONG,
        }
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::AlreadyExists(msg) => io::Error::new(io::ErrorKind::AlreadyExists, msg),
            VfsError::NotADirectory(msg) => io::Error::new(io::ErrorKind::NotADirectory, msg),
            VfsError::IsADirectory(msg) => io::Error::new(io::ErrorKind::IsADirectory, msg),
            VfsError::OutOfSpace => {
                io::Error::new(io::ErrorKind::StorageFull, "no free chunks left")
            }
            VfsError::InvalidOffset(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::NameTooLong(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
